//! Binary entry point: set up logging, then hand off to the CLI.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = fusion_batch::cli::parse_cli();

    // RUST_LOG takes precedence when set; otherwise fall back to the
    // --log-level flag (default "info").
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    fusion_batch::cli::run_with_cli(cli).await
}
