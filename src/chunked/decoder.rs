use std::pin::Pin;

use async_std::io::{self, BufRead, Read};
use async_std::task::{Context, Poll};
use futures_lite::ready;
use pin_project::pin_project;

/// Decodes a chunked body according to
/// https://tools.ietf.org/html/rfc7230#section-4.1
///
/// An incremental state machine over the inner reader: a hex size line,
/// that many data bytes, a closing CRLF, repeated until the zero-size
/// chunk, whose trailer section is skipped through its terminating blank
/// line. Data bytes are borrowed straight out of the inner buffer via
/// `BufRead`.
#[pin_project]
#[derive(Debug)]
pub(crate) struct ChunkedDecoder<R: BufRead> {
    /// The underlying stream.
    #[pin]
    inner: R,
    /// Current state.
    state: State,
}

impl<R: BufRead> ChunkedDecoder<R> {
    pub(crate) fn new(inner: R) -> Self {
        ChunkedDecoder {
            inner,
            state: State::Size {
                size: 0,
                sub: SizeState::Digits,
            },
        }
    }
}

/// Largest chunk size we accept; keeps the shifted accumulator in range.
const MAX_CHUNK_SIZE: u64 = 0x0FFF_FFFF_FFFF_FFFF;

#[derive(Debug, Clone, Copy)]
enum State {
    /// Reading the hex chunk size line.
    Size { size: u64, sub: SizeState },
    /// Inside the data section of a chunk.
    Data { remaining: u64 },
    /// Reading the CRLF that closes a data section.
    DataEnd { cr_seen: bool },
    /// Skipping trailer lines after the final chunk.
    Trailer { line_empty: bool },
    /// The terminating blank line has been consumed.
    Done,
}

#[derive(Debug, Clone, Copy)]
enum SizeState {
    Digits,
    Extension,
    Newline,
}

fn size_step(size: u64, sub: SizeState, byte: u8) -> io::Result<State> {
    let next = match sub {
        SizeState::Digits => match byte {
            b'0'..=b'9' => State::Size {
                size: (size << 4) + u64::from(byte - b'0'),
                sub,
            },
            b'a'..=b'f' => State::Size {
                size: (size << 4) + u64::from(byte - b'a' + 10),
                sub,
            },
            b'A'..=b'F' => State::Size {
                size: (size << 4) + u64::from(byte - b'A' + 10),
                sub,
            },
            b';' => State::Size {
                size,
                sub: SizeState::Extension,
            },
            b'\r' => State::Size {
                size,
                sub: SizeState::Newline,
            },
            _ => return Err(invalid_frame("invalid chunk size")),
        },
        SizeState::Extension => match byte {
            b'\r' => State::Size {
                size,
                sub: SizeState::Newline,
            },
            _ => State::Size { size, sub },
        },
        SizeState::Newline => match byte {
            b'\n' if size == 0 => State::Trailer { line_empty: true },
            b'\n' => State::Data { remaining: size },
            _ => return Err(invalid_frame("invalid chunk size line")),
        },
    };
    if let State::Size { size, .. } = next {
        if size > MAX_CHUNK_SIZE {
            return Err(invalid_frame("chunk size out of range"));
        }
    }
    Ok(next)
}

/// Advance the framing state machine over `buf`, returning how many bytes
/// were consumed. Stops as soon as the state enters a data section or the
/// end of the stream.
fn advance(state: &mut State, buf: &[u8]) -> io::Result<usize> {
    for (offset, byte) in buf.iter().copied().enumerate() {
        let next = match *state {
            State::Size { size, sub } => size_step(size, sub, byte)?,
            State::DataEnd { cr_seen } => match (byte, cr_seen) {
                (b'\r', false) => State::DataEnd { cr_seen: true },
                (b'\n', true) => State::Size {
                    size: 0,
                    sub: SizeState::Digits,
                },
                _ => return Err(invalid_frame("missing CRLF after chunk data")),
            },
            State::Trailer { line_empty } => match byte {
                b'\r' => State::Trailer { line_empty },
                b'\n' if line_empty => State::Done,
                b'\n' => State::Trailer { line_empty: true },
                _ => State::Trailer { line_empty: false },
            },
            State::Data { .. } | State::Done => return Ok(offset),
        };
        *state = next;
        if matches!(*state, State::Data { .. } | State::Done) {
            return Ok(offset + 1);
        }
    }
    Ok(buf.len())
}

impl<R: BufRead> Read for ChunkedDecoder<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let inner_buf = ready!(self.as_mut().poll_fill_buf(cx))?;
        let len = buf.len().min(inner_buf.len());
        buf[..len].copy_from_slice(&inner_buf[..len]);
        self.consume(len);

        Poll::Ready(Ok(len))
    }
}

impl<R: BufRead> BufRead for ChunkedDecoder<R> {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let mut this = self.project();

        // Work through framing bytes until we sit inside a data section
        // or the stream has ended.
        let remaining = loop {
            match *this.state {
                State::Data { remaining } => break remaining,
                State::Done => return Poll::Ready(Ok(&[])),
                _ => {}
            }

            let consumed = {
                let inner_buf = ready!(this.inner.as_mut().poll_fill_buf(cx))?;
                if inner_buf.is_empty() {
                    return Poll::Ready(Err(unexpected_eof()));
                }
                advance(this.state, inner_buf)?
            };
            this.inner.as_mut().consume(consumed);
        };

        debug_assert!(remaining > 0);
        let inner_buf = ready!(this.inner.poll_fill_buf(cx))?;
        if inner_buf.is_empty() {
            return Poll::Ready(Err(unexpected_eof()));
        }
        let len = remaining.min(inner_buf.len() as u64) as usize;
        Poll::Ready(Ok(&inner_buf[..len]))
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        if amt == 0 {
            return;
        }
        let this = self.project();
        if let State::Data { remaining } = &mut *this.state {
            debug_assert!(amt as u64 <= *remaining);
            *remaining -= amt as u64;
            if *remaining == 0 {
                *this.state = State::DataEnd { cr_seen: false };
            }
            this.inner.consume(amt);
        } else {
            debug_assert!(false, "consumed {} bytes outside a data section", amt);
        }
    }
}

fn invalid_frame(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn unexpected_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed mid-body")
}
