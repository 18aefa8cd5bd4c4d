use std::pin::Pin;

use async_std::io::{self, Read};
use async_std::task::{Context, Poll};
use futures_lite::ready;

/// An encoder for chunked encoding.
///
/// Every read from the inner reader becomes exactly one
/// `<hex-size>\r\n<data>\r\n` frame, so data goes out as soon as the
/// inner reader produces it. Inner end-of-stream becomes the `0\r\n\r\n`
/// terminal frame, after which the encoder itself reports end-of-stream.
#[derive(Debug)]
pub(crate) struct ChunkedEncoder<R> {
    reader: R,
    done: bool,
}

impl<R: Read + Unpin> ChunkedEncoder<R> {
    /// Create a new instance.
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

/// How much of `buf` may hold chunk data, leaving room for the hex size
/// prefix and the two CRLF separators of one frame.
fn data_capacity(buf_len: usize) -> usize {
    let framing = format!("{:X}", buf_len).len() + 4;
    assert!(
        buf_len > framing,
        "buffer of {} bytes is too small to hold a chunked frame",
        buf_len
    );
    buf_len - framing
}

impl<R: Read + Unpin> Read for ChunkedEncoder<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(Ok(0));
        }

        let max_data = data_capacity(buf.len());
        let len = ready!(Pin::new(&mut this.reader).poll_read(cx, &mut buf[..max_data]))?;
        if len == 0 {
            this.done = true;
        }

        let prefix = format!("{:X}\r\n", len);
        let prefix_len = prefix.len();
        let total = prefix_len + len + 2;
        buf.copy_within(..len, prefix_len);
        buf[..prefix_len].copy_from_slice(prefix.as_bytes());
        buf[total - 2..total].copy_from_slice(b"\r\n");
        Poll::Ready(Ok(total))
    }
}
