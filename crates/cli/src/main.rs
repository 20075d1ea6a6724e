//! # Broadcast CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Config loading and validation
//! - Building broadcasters and dispatching a message
//! - Cancellation on Ctrl+C or timeout

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_schemes, run_send, run_validate};
use observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet, cli.log_format.into())
            .with_metrics_port(cli.metrics_port),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "Broadcast CLI starting");

    let result = match &cli.command {
        Commands::Send(args) => run_send(args).await,
        Commands::Schemes(args) => run_schemes(args),
        Commands::Validate(args) => run_validate(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
