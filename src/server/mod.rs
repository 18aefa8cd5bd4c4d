//! Process HTTP connections on the server.

use std::net::SocketAddr;
use std::time::Duration;

use async_std::io::{self, BufReader, Read, Write};
use async_std::net::TcpListener;
use async_std::prelude::*;
use async_std::task;
use http_types::headers::CONTENT_TYPE;
use http_types::{format_err, Body, Response, StatusCode};
use log::{error, info, trace};

mod decode;
mod encode;

pub use decode::decode;
pub use encode::Encoder;

use crate::ChunkSource;

/// Configure the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Defaults to `127.0.0.1:3000`.
    pub addr: SocketAddr,
    /// How many chunks each response carries. Defaults to 10.
    pub chunk_count: usize,
    /// How long to wait before producing each chunk. Defaults to 1s.
    pub chunk_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
            chunk_count: 10,
            chunk_delay: Duration::from_secs(1),
        }
    }
}

/// Answer one incoming HTTP/1.1 exchange with the default configuration.
pub async fn accept<RW>(io: RW) -> crate::Result<()>
where
    RW: Read + Write + Clone + Send + Sync + Unpin + 'static,
{
    accept_with_config(io, ServerConfig::default()).await
}

/// Answer one incoming HTTP/1.1 exchange on `io`.
///
/// Whatever the method or path, the response is `200 OK` with
/// `content-type: text/plain`, in chunked transfer encoding, carrying
/// `config.chunk_count` text chunks spaced `config.chunk_delay` apart.
/// The connection is good for exactly one exchange. A failed write
/// (typically the peer going away mid-stream) stops chunk production
/// and is returned as an error.
pub async fn accept_with_config<RW>(io: RW, config: ServerConfig) -> crate::Result<()>
where
    RW: Read + Write + Clone + Send + Sync + Unpin + 'static,
{
    let req = match decode(io.clone()).await? {
        Some(req) => req,
        None => return Ok(()), // closed before a request arrived
    };
    trace!("request: {} {}", req.method(), req.url());

    let mut res = Response::new(StatusCode::Ok);
    res.insert_header(CONTENT_TYPE, "text/plain");
    let source = ChunkSource::new(config.chunk_count, config.chunk_delay);
    res.set_body(Body::from_reader(BufReader::new(source), None));

    // Stream the response to the writer.
    let mut encoder = Encoder::new(res);
    let mut writer = io;
    io::copy(&mut encoder, &mut writer).await?;
    Ok(())
}

/// Bind the configured address and serve until the future is dropped.
///
/// Every connection gets its own task; a connection-level error is
/// logged and the listener keeps going. Failing to bind, most commonly
/// because the port is already taken, is reported right away.
pub async fn listen(config: ServerConfig) -> crate::Result<()> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|err| format_err!("could not bind {}: {}", config.addr, err))?;
    info!("listening on http://{}/", listener.local_addr()?);

    let mut incoming = listener.incoming();
    while let Some(stream) = incoming.next().await {
        let stream = stream?;
        let config = config.clone();
        task::spawn(async move {
            if let Err(err) = accept_with_config(stream, config).await {
                error!("connection error: {}", err);
            }
        });
    }
    Ok(())
}
