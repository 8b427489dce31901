use anyhow::Result;
use dirdoc::cli::{init_logging, parse_server_args};
use dirdoc::server::serve;

#[tokio::main]
async fn main() -> Result<()> {
    let config = parse_server_args();
    init_logging(config.verbosity);
    serve(config).await
}
