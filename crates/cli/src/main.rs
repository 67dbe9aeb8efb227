//! # flp CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading with CLI / environment overrides
//! - `read`: dump raw lines or parsed records
//! - `index`: stream records into the indexing backend
//! - `validate`: check a configuration file

mod cli;
mod commands;
mod error;
mod pipeline;
mod settings;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_index, run_read, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(version = env!("CARGO_PKG_VERSION"), "flp starting");

    let result = match &cli.command {
        Commands::Read(args) => run_read(args),
        Commands::Index(args) => run_index(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }

    result
}

/// Map verbosity flags onto the tracing setup
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let (level, force_level) = if cli.quiet {
        ("warn", true)
    } else {
        match cli.verbose {
            0 => ("info", false),
            1 => ("debug", true),
            _ => ("trace", true),
        }
    };

    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: level.to_string(),
        force_level,
    }
}
