//! Encode an HTTP request for the wire.

use std::io::Write;

use http_types::{format_err, Request};

/// Serialize `req`, head and body both, into a buffer ready to be
/// written to the transport.
///
/// Requests in this crate are tiny (a bodyless `GET` in the common
/// case), so unlike the response side nothing is streamed: a body, when
/// present, is read to the end and sent with a `content-length`.
pub(crate) async fn encode(req: &mut Request) -> crate::Result<Vec<u8>> {
    let mut buf = Vec::new();

    let url = req.url();
    let host = url
        .host_str()
        .ok_or_else(|| format_err!("missing hostname"))?
        .to_owned();
    let port = url.port();
    write!(buf, "{} {} HTTP/1.1\r\n", req.method(), url.path())?;
    match port {
        Some(port) => write!(buf, "host: {}:{}\r\n", host, port)?,
        None => write!(buf, "host: {}\r\n", host)?,
    }

    let body = req.take_body().into_bytes().await?;
    if !body.is_empty() {
        write!(buf, "content-length: {}\r\n", body.len())?;
    }

    for (name, values) in req.iter() {
        for value in values.iter() {
            write!(buf, "{}: {}\r\n", name, value)?;
        }
    }

    write!(buf, "\r\n")?;
    buf.extend_from_slice(&body);
    Ok(buf)
}
