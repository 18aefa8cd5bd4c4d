//! Process HTTP connections on the client.

use async_std::io::{Read, Write};
use async_std::prelude::*;
use http_types::{Request, Response};
use log::trace;

mod chunks;
mod decode;
mod encode;

pub use chunks::TextChunks;
pub use decode::decode;

/// Send `req` over `stream` and decode the response.
///
/// Only the response head is read before this returns; the body stays
/// lazy and keeps pulling from `stream` as it is consumed. The stream is
/// good for a single exchange; repeating it means dialing a new
/// connection.
pub async fn connect<RW>(mut stream: RW, mut req: Request) -> crate::Result<Response>
where
    RW: Read + Write + Send + Sync + Unpin + 'static,
{
    let head = encode::encode(&mut req).await?;
    stream.write_all(&head).await?;
    stream.flush().await?;
    trace!("request sent: {} {}", req.method(), req.url());

    decode(stream).await
}
