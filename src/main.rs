//! ci-benchmarker CLI entry point.
//!
//! Initializes logging and delegates to the CLI module for command handling.

use ci_benchmarker::cli::LogFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ci_benchmarker::cli::parse_cli();

    let rust_log = std::env::var("RUST_LOG").ok();
    let debug = std::env::var("DEBUG").ok();
    let source = cli.log_filter(rust_log.as_deref(), debug.as_deref());

    let filter = match source {
        LogFilter::Env => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        LogFilter::Debug => EnvFilter::new("debug"),
        LogFilter::Level(ref level) => EnvFilter::new(level),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if source == LogFilter::Debug {
        tracing::warn!("DEBUG MODE ENABLED");
    }

    ci_benchmarker::cli::run_with_cli(cli).await
}
