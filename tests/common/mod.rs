use std::io;
use std::pin::Pin;
use std::sync::RwLock;
use std::task::{Context, Poll, Waker};

use async_dup::Arc;
use async_std::io::{Read, Write};

/// One half of an in-memory duplex stream: everything one side writes,
/// the other side reads. Either side can hang up, after which its peer
/// sees end-of-stream on reads and zero-length writes.
#[derive(Clone)]
pub struct TestIO {
    read: Arc<CloseableCursor>,
    write: Arc<CloseableCursor>,
}

impl TestIO {
    /// Build a connected (client, server) pair.
    pub fn pair() -> (TestIO, TestIO) {
        let client = Arc::new(CloseableCursor::default());
        let server = Arc::new(CloseableCursor::default());

        (
            TestIO {
                read: client.clone(),
                write: server.clone(),
            },
            TestIO {
                read: server,
                write: client,
            },
        )
    }

    /// Everything the peer has written to this side so far.
    #[allow(dead_code)]
    pub fn received(&self) -> Vec<u8> {
        self.read.snapshot()
    }

    /// Hang up: the peer's writes start failing and its reads see
    /// end-of-stream once the buffered bytes run out.
    #[allow(dead_code)]
    pub fn close(&self) {
        self.read.close();
        self.write.close();
    }
}

#[derive(Debug, Default)]
pub struct CloseableCursor {
    data: RwLock<Vec<u8>>,
    cursor: RwLock<usize>,
    waker: RwLock<Option<Waker>>,
    closed: RwLock<bool>,
}

impl CloseableCursor {
    fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    fn cursor(&self) -> usize {
        *self.cursor.read().unwrap()
    }

    fn snapshot(&self) -> Vec<u8> {
        self.data.read().unwrap().clone()
    }

    fn close(&self) {
        if let Some(waker) = self.waker.write().unwrap().take() {
            waker.wake();
        }
        *self.closed.write().unwrap() = true;
    }
}

impl Read for &CloseableCursor {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let len = self.len();
        let cursor = self.cursor();
        if cursor < len {
            let data = &*self.data.read().unwrap();
            let bytes_to_copy = buf.len().min(len - cursor);
            buf[..bytes_to_copy].copy_from_slice(&data[cursor..cursor + bytes_to_copy]);
            *self.cursor.write().unwrap() += bytes_to_copy;
            Poll::Ready(Ok(bytes_to_copy))
        } else if *self.closed.read().unwrap() {
            Poll::Ready(Ok(0))
        } else {
            *self.waker.write().unwrap() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl Write for &CloseableCursor {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if *self.closed.read().unwrap() {
            Poll::Ready(Ok(0))
        } else {
            self.data.write().unwrap().extend_from_slice(buf);
            if let Some(waker) = self.waker.write().unwrap().take() {
                waker.wake();
            }
            Poll::Ready(Ok(buf.len()))
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if let Some(waker) = self.waker.write().unwrap().take() {
            waker.wake();
        }
        *self.closed.write().unwrap() = true;
        Poll::Ready(Ok(()))
    }
}

impl Read for TestIO {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut &*self.read).poll_read(cx, buf)
    }
}

impl Write for TestIO {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut &*self.write).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut &*self.write).poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut &*self.write).poll_close(cx)
    }
}
