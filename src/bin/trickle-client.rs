use async_std::net::TcpStream;
use async_std::prelude::*;
use async_std::task;
use http_types::{Method, Request, Url};
use trickle::client::{self, TextChunks};

fn main() -> trickle::Result<()> {
    task::block_on(async {
        let stream = TcpStream::connect("127.0.0.1:3000").await?;
        let req = Request::new(Method::Get, Url::parse("http://127.0.0.1:3000/")?);
        let res = client::connect(stream, req).await?;

        let mut chunks = TextChunks::new(res);
        while let Some(chunk) = chunks.next().await {
            print!("{}", chunk?);
        }
        Ok(())
    })
}
