use async_std::task;
use trickle::server::{self, ServerConfig};

fn main() -> trickle::Result<()> {
    task::block_on(async {
        let config = ServerConfig::default();
        println!("listening on http://{}/", config.addr);
        server::listen(config).await
    })
}
