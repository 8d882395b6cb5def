use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use as_siblings::cli::Cli;

fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=as_siblings=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("as_siblings=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    cli.execute()
}
