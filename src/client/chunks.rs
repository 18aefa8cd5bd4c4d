//! A response body as a lazy sequence of text chunks.

use std::fmt;
use std::pin::Pin;

use async_std::io::{self, Read};
use async_std::task::{Context, Poll};
use futures_lite::{ready, Stream};
use http_types::Response;

/// The chunks of a response body, decoded to text as they arrive.
///
/// One stream item per body read; for a chunked response that is one
/// transfer-encoding frame, i.e. one producer-side chunk. Bytes are
/// decoded as UTF-8 per chunk with no carry-over between chunks, so a
/// multi-byte character split across two chunks comes out as replacement
/// characters rather than an error. The stream is single-pass: once the
/// body reports end-of-stream it stays finished.
pub struct TextChunks {
    res: Response,
    buf: Vec<u8>,
}

impl TextChunks {
    /// Wrap a response, consuming its body chunk by chunk.
    pub fn new(res: Response) -> Self {
        Self {
            res,
            buf: vec![0; 8 * 1024],
        }
    }
}

impl fmt::Debug for TextChunks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextChunks").field("res", &self.res).finish()
    }
}

impl Stream for TextChunks {
    type Item = io::Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.res).poll_read(cx, &mut this.buf)) {
            Ok(0) => Poll::Ready(None),
            Ok(len) => {
                let text = String::from_utf8_lossy(&this.buf[..len]).into_owned();
                Poll::Ready(Some(Ok(text)))
            }
            Err(err) => Poll::Ready(Some(Err(err))),
        }
    }
}
