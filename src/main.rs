use clap::Parser;

use vidtag::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::debug!("vidtag v{} invoked with {:?}", env!("CARGO_PKG_VERSION"), cli.text);
    cli.run().await
}
