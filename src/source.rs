use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_io::Timer;
use async_std::io::{self, Read};
use async_std::task::{Context, Poll};
use futures_lite::ready;
use log::trace;

/// A bounded source of timed text chunks.
///
/// The pull-based form of a generator that sleeps, then yields: producing
/// chunk `i` means waiting out `delay`, then handing over the line
/// `Data chunk {i}\n`. After `count` chunks the source reports
/// end-of-stream. Reads never merge two chunks; a single read only ever
/// returns bytes belonging to one chunk.
#[derive(Debug)]
pub struct ChunkSource {
    /// Index of the next chunk to produce.
    index: usize,
    /// Total number of chunks to produce.
    count: usize,
    /// How long to wait before producing each chunk.
    delay: Duration,
    /// Timer armed for the chunk currently being waited on.
    timer: Option<Timer>,
    /// Bytes of the current chunk not yet handed to the caller.
    pending: Vec<u8>,
}

impl ChunkSource {
    /// Create a source that produces `count` chunks spaced `delay` apart.
    pub fn new(count: usize, delay: Duration) -> Self {
        Self {
            index: 0,
            count,
            delay,
            timer: None,
            pending: Vec::new(),
        }
    }
}

impl Read for ChunkSource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        loop {
            // Drain the current chunk before producing the next one.
            if !this.pending.is_empty() {
                let len = buf.len().min(this.pending.len());
                buf[..len].copy_from_slice(&this.pending[..len]);
                this.pending.drain(..len);
                return Poll::Ready(Ok(len));
            }

            if this.index == this.count {
                return Poll::Ready(Ok(0));
            }

            let delay = this.delay;
            let timer = this.timer.get_or_insert_with(|| Timer::after(delay));
            ready!(Pin::new(timer).poll(cx));
            this.timer = None;

            let chunk = format!("Data chunk {}\n", this.index);
            trace!("produced chunk {}", this.index);
            this.index += 1;
            this.pending = chunk.into_bytes();
        }
    }
}
