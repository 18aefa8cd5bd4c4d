mod common;

use std::time::{Duration, Instant};

use async_std::prelude::*;
use async_std::task;
use common::TestIO;
use http_types::{Method, Request, Url};
use pretty_assertions::assert_eq;
use trickle::client::{self, TextChunks};
use trickle::server::{self, ServerConfig};

fn request() -> Request {
    Request::new(Method::Get, Url::parse("http://example.com/").unwrap())
}

fn config(count: usize, delay: Duration) -> ServerConfig {
    ServerConfig {
        chunk_count: count,
        chunk_delay: delay,
        ..ServerConfig::default()
    }
}

#[async_std::test]
async fn one_request_streams_the_whole_run() -> trickle::Result<()> {
    let (client_io, server_io) = TestIO::pair();
    let producer = task::spawn(server::accept_with_config(
        server_io,
        config(10, Duration::ZERO),
    ));

    let res = client::connect(client_io, request()).await?;
    let mut chunks = TextChunks::new(res);
    let mut lines = Vec::new();
    while let Some(chunk) = chunks.next().await {
        lines.push(chunk?);
    }

    let expected: Vec<String> = (0..10).map(|i| format!("Data chunk {}\n", i)).collect();
    assert_eq!(lines, expected);
    assert_eq!(
        lines.concat(),
        "Data chunk 0\nData chunk 1\nData chunk 2\nData chunk 3\nData chunk 4\n\
         Data chunk 5\nData chunk 6\nData chunk 7\nData chunk 8\nData chunk 9\n"
    );

    producer.await?;
    Ok(())
}

#[async_std::test]
async fn chunks_are_paced_not_batched() -> trickle::Result<()> {
    let delay = Duration::from_millis(20);
    let (client_io, server_io) = TestIO::pair();
    let producer = task::spawn(server::accept_with_config(server_io, config(5, delay)));

    let started = Instant::now();
    let res = client::connect(client_io, request()).await?;
    let mut chunks = TextChunks::new(res);
    let mut count = 0;
    while let Some(chunk) = chunks.next().await {
        chunk?;
        count += 1;
    }
    let elapsed = started.elapsed();

    assert_eq!(count, 5);
    assert!(
        elapsed >= delay * 5,
        "five paced chunks arrived in only {:?}",
        elapsed
    );

    producer.await?;
    Ok(())
}

#[async_std::test]
async fn a_consumer_hanging_up_mid_stream_stops_the_producer() -> trickle::Result<()> {
    let (client_io, server_io) = TestIO::pair();
    let producer = task::spawn(server::accept_with_config(
        server_io,
        config(10, Duration::from_millis(20)),
    ));

    let res = client::connect(client_io.clone(), request()).await?;
    let mut chunks = TextChunks::new(res);
    let first = chunks.next().await.unwrap()?;
    assert_eq!(first, "Data chunk 0\n");

    drop(chunks);
    client_io.close();

    let result = producer.await;
    assert!(result.is_err(), "the producer should see the broken pipe");
    Ok(())
}
