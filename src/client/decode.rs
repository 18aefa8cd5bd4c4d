//! Decode an HTTP response on the client.

use std::convert::TryFrom;
use std::str::FromStr;

use async_std::io::{BufReader, Read};
use async_std::prelude::*;
use http_types::headers::{HeaderName, HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use http_types::{ensure, ensure_eq, format_err};
use http_types::{Body, Response, StatusCode};
use log::trace;

use crate::chunked::ChunkedDecoder;
use crate::{MAX_HEADERS, MAX_HEAD_LENGTH};

const LF: u8 = b'\n';

/// Decode an HTTP response on the client.
///
/// Only the head is read eagerly. The returned response's body stays
/// lazy: a chunked body decodes frame by frame as it is read, a sized
/// body reads up to its `content-length`.
pub async fn decode<R>(reader: R) -> crate::Result<Response>
where
    R: Read + Unpin + Send + Sync + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut httparse_res = httparse::Response::new(&mut headers);

    // Keep reading bytes from the stream until we hit the end of the head.
    loop {
        let bytes_read = reader.read_until(LF, &mut buf).await?;
        ensure!(bytes_read != 0, "connection closed before a response head");

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
    let status = httparse_res.parse(&buf)?;
    ensure!(!status.is_partial(), "Malformed HTTP head");

    let code = httparse_res
        .code
        .ok_or_else(|| format_err!("No status code found"))?;
    let version = httparse_res
        .version
        .ok_or_else(|| format_err!("No version found"))?;
    ensure_eq!(version, 1, "Unsupported HTTP version");

    let mut res = Response::new(StatusCode::try_from(code)?);
    for header in httparse_res.headers.iter() {
        let name = HeaderName::from_str(header.name)?;
        let value = HeaderValue::from_str(std::str::from_utf8(header.value)?)?;
        res.append_header(name, value);
    }

    let content_length = res.header(CONTENT_LENGTH);
    let transfer_encoding = res.header(TRANSFER_ENCODING);

    ensure!(
        content_length.is_none() || transfer_encoding.is_none(),
        "Unexpected Content-Length header"
    );

    if let Some(encoding) = transfer_encoding {
        ensure_eq!(
            encoding.last().as_str(),
            "chunked",
            "Unsupported transfer encoding"
        );
        trace!("response head decoded, chunked body follows");
        let body_reader = BufReader::new(ChunkedDecoder::new(reader));
        res.set_body(Body::from_reader(body_reader, None));
        return Ok(res);
    }

    if let Some(len) = content_length {
        let len = len.last().as_str().parse::<usize>()?;
        res.set_body(Body::from_reader(reader.take(len as u64), Some(len)));
    }

    Ok(res)
}
