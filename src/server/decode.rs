//! Decode an HTTP request on the server.

use std::str::FromStr;

use async_std::io::{BufReader, Read};
use async_std::prelude::*;
use http_types::headers::{HeaderName, HeaderValue};
use http_types::{ensure, ensure_eq, format_err};
use http_types::{Method, Request, Url, Version};

use crate::{MAX_HEADERS, MAX_HEAD_LENGTH};

const LF: u8 = b'\n';

/// The number returned from httparse when the request is HTTP 1.1.
const HTTP_1_1_VERSION: u8 = 1;

/// Decode an HTTP request head on the server.
///
/// Returns `Ok(None)` when the connection closes before a request
/// arrives. Every method and path is accepted; a request body, if any,
/// is left unread; this server streams the same response to everyone.
pub async fn decode<R>(reader: R) -> crate::Result<Option<Request>>
where
    R: Read + Unpin + Send + Sync + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut httparse_req = httparse::Request::new(&mut headers);

    // Keep reading bytes from the stream until we hit the end of the head.
    loop {
        let bytes_read = reader.read_until(LF, &mut buf).await?;
        // No more bytes are yielded from the stream.
        if bytes_read == 0 {
            return Ok(None);
        }

        // Prevent CWE-400 DDOS with large HTTP Headers.
        ensure!(
            buf.len() < MAX_HEAD_LENGTH,
            "Head byte length should be less than 8kb"
        );

        // We've hit the end delimiter of the stream.
        let idx = buf.len() - 1;
        if idx >= 3 && &buf[idx - 3..=idx] == b"\r\n\r\n" {
            break;
        }
    }

    // Convert our header buf into an httparse instance, and validate.
    let status = httparse_req.parse(&buf)?;
    ensure!(!status.is_partial(), "Malformed HTTP head");

    let method = httparse_req
        .method
        .ok_or_else(|| format_err!("No method found"))?;
    let version = httparse_req
        .version
        .ok_or_else(|| format_err!("No version found"))?;
    ensure_eq!(
        version,
        HTTP_1_1_VERSION,
        "Unsupported HTTP version 1.{}",
        version
    );

    let url = url_from_httparse_req(&httparse_req)?;
    let mut req = Request::new(Method::from_str(method)?, url);
    req.set_version(Some(Version::Http1_1));

    for header in httparse_req.headers.iter() {
        let name = HeaderName::from_str(header.name)?;
        let value = HeaderValue::from_str(std::str::from_utf8(header.value)?)?;
        req.append_header(name, value);
    }

    Ok(Some(req))
}

fn url_from_httparse_req(req: &httparse::Request<'_, '_>) -> crate::Result<Url> {
    let path = req.path.ok_or_else(|| format_err!("No uri found"))?;

    let host = req
        .headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case("host"))
        .map(|header| std::str::from_utf8(header.value))
        .transpose()?
        .unwrap_or("localhost");

    if path.starts_with("http://") || path.starts_with("https://") {
        Ok(Url::parse(path)?)
    } else if path.starts_with('/') {
        Ok(Url::parse(&format!("http://{}{}", host, path))?)
    } else {
        Err(format_err!("unexpected uri format"))
    }
}
