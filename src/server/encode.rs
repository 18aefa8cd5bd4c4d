//! Encode an HTTP response onto the wire.

use std::io::Write;
use std::mem;
use std::pin::Pin;

use async_std::io::{self, Read};
use async_std::task::{Context, Poll};
use http_types::Response;

use crate::chunked::ChunkedEncoder;

/// A streaming HTTP response encoder.
///
/// Reads as the serialized head followed by the body: raw bytes when the
/// body length is known upfront, chunked frames when it is not. The body
/// is pulled only as the encoder is read, so a streaming body reaches the
/// wire chunk by chunk instead of being buffered whole.
#[derive(Debug)]
pub struct Encoder {
    state: EncoderState,
}

#[derive(Debug)]
enum EncoderState {
    /// Head not serialized yet.
    Start(Response),
    /// Draining the serialized head.
    Head {
        head: Vec<u8>,
        head_bytes_read: usize,
        res: Response,
    },
    /// Streaming a body whose length was declared in the head.
    Fixed {
        res: Response,
        body_bytes_read: usize,
        body_len: usize,
    },
    /// Framing a body of unknown length in chunked encoding.
    Chunked(ChunkedEncoder<Response>),
    /// All done.
    Done,
}

impl Encoder {
    /// Create an encoder for `res`.
    pub fn new(res: Response) -> Self {
        Self {
            state: EncoderState::Start(res),
        }
    }
}

// Encode the status line and headers to a buffer.
fn serialize_head(res: &Response) -> io::Result<Vec<u8>> {
    let mut head = Vec::new();
    let reason = res.status().canonical_reason();
    write!(head, "HTTP/1.1 {} {}\r\n", res.status(), reason)?;

    // If the body isn't streaming, we can set the content-length ahead of
    // time. Else we need to send all items in chunks.
    match res.len() {
        Some(len) => write!(head, "content-length: {}\r\n", len)?,
        None => write!(head, "transfer-encoding: chunked\r\n")?,
    }

    for (name, values) in res.iter() {
        for value in values.iter() {
            write!(head, "{}: {}\r\n", name, value)?;
        }
    }

    write!(head, "\r\n")?;
    Ok(head)
}

impl Read for Encoder {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        // Bytes of `buf` filled in this call.
        let mut bytes_read = 0;
        loop {
            match mem::replace(&mut this.state, EncoderState::Done) {
                EncoderState::Start(res) => {
                    let head = serialize_head(&res)?;
                    this.state = EncoderState::Head {
                        head,
                        head_bytes_read: 0,
                        res,
                    };
                }
                EncoderState::Head {
                    head,
                    mut head_bytes_read,
                    res,
                } => {
                    let len = (head.len() - head_bytes_read).min(buf.len() - bytes_read);
                    buf[bytes_read..bytes_read + len]
                        .copy_from_slice(&head[head_bytes_read..head_bytes_read + len]);
                    bytes_read += len;
                    head_bytes_read += len;

                    if head_bytes_read < head.len() {
                        // `buf` filled up before the head was out.
                        this.state = EncoderState::Head {
                            head,
                            head_bytes_read,
                            res,
                        };
                        return Poll::Ready(Ok(bytes_read));
                    }

                    // The response length lets us know if we are encoding
                    // our body in chunks or not.
                    this.state = match res.len() {
                        Some(body_len) => EncoderState::Fixed {
                            res,
                            body_bytes_read: 0,
                            body_len,
                        },
                        None => EncoderState::Chunked(ChunkedEncoder::new(res)),
                    };
                }
                EncoderState::Fixed {
                    mut res,
                    mut body_bytes_read,
                    body_len,
                } => {
                    if bytes_read == buf.len() {
                        this.state = EncoderState::Fixed {
                            res,
                            body_bytes_read,
                            body_len,
                        };
                        return Poll::Ready(Ok(bytes_read));
                    }

                    let upper = (bytes_read + body_len - body_bytes_read).min(buf.len());
                    match Pin::new(&mut res).poll_read(cx, &mut buf[bytes_read..upper]) {
                        Poll::Ready(Ok(len)) => {
                            bytes_read += len;
                            body_bytes_read += len;
                            if body_bytes_read == body_len || len == 0 {
                                // Done, or the body ended short of its
                                // declared length.
                                return Poll::Ready(Ok(bytes_read));
                            }
                            this.state = EncoderState::Fixed {
                                res,
                                body_bytes_read,
                                body_len,
                            };
                        }
                        Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                        Poll::Pending => {
                            this.state = EncoderState::Fixed {
                                res,
                                body_bytes_read,
                                body_len,
                            };
                            if bytes_read == 0 {
                                return Poll::Pending;
                            }
                            return Poll::Ready(Ok(bytes_read));
                        }
                    }
                }
                EncoderState::Chunked(mut body) => {
                    // Leave room for at least a small frame; anything
                    // shorter waits for the next call's fresh buffer.
                    if bytes_read > 0 && buf.len() - bytes_read < 16 {
                        this.state = EncoderState::Chunked(body);
                        return Poll::Ready(Ok(bytes_read));
                    }

                    match Pin::new(&mut body).poll_read(cx, &mut buf[bytes_read..]) {
                        Poll::Ready(Ok(0)) => {
                            // The terminal frame has already been emitted.
                            return Poll::Ready(Ok(bytes_read));
                        }
                        Poll::Ready(Ok(len)) => {
                            bytes_read += len;
                            this.state = EncoderState::Chunked(body);
                            return Poll::Ready(Ok(bytes_read));
                        }
                        Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                        Poll::Pending => {
                            this.state = EncoderState::Chunked(body);
                            if bytes_read == 0 {
                                return Poll::Pending;
                            }
                            return Poll::Ready(Ok(bytes_read));
                        }
                    }
                }
                EncoderState::Done => return Poll::Ready(Ok(bytes_read)),
            }
        }
    }
}
