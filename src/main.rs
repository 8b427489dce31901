use anyhow::Result;
use dirdoc::cli::{init_logging, parse_args};
use dirdoc::generate;

#[tokio::main]
async fn main() -> Result<()> {
    let config = parse_args()?;
    init_logging(config.verbosity);
    generate(&config.source_root, &config.output_path).await
}
