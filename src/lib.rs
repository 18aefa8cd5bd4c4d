//! Timed chunked HTTP/1.1 streaming.
//!
//! One producer, one consumer, one connection. The producer answers every
//! request with a `text/plain` response in chunked transfer encoding whose
//! body is a bounded run of text chunks, one per timed tick. The consumer
//! issues a single request and reads the body back as a lazy stream of
//! decoded strings, one item per chunk as it arrives.
//!
//! - `server` decodes HTTP requests, and encodes timed chunked responses.
//! - `client` encodes HTTP requests, and decodes responses into text chunks.
//!
//! ```txt
//!   encode                  decode
//!        \                  /
//!        ->    request     ->
//! client                      server
//!        <- chunked stream <-
//!        /                  \
//!   decode                  encode
//! ```
//!
//! The library is transport-generic: both halves operate on any async
//! duplex stream, which is also how the tests drive a whole exchange
//! in memory. See [`server::listen`] for the TCP entry point.

#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

/// The maximum amount of headers parsed on both server and client.
const MAX_HEADERS: usize = 128;

/// The maximum length of the head section we'll try to parse, in bytes.
const MAX_HEAD_LENGTH: usize = 8 * 1024;

pub use http_types::{Error, Result};
pub use source::ChunkSource;

mod chunked;
mod source;

pub mod client;
pub mod server;
