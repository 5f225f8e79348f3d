use clap::Parser;
use opendal::cli::{Cli, run};
use opendal::startup::{LoggingConfig, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging(&LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    run(Cli::parse()).await
}
