//! # Livox Scan CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Scanner lifecycle with graceful shutdown
//! - Device discovery

mod cli;
mod commands;
mod config;
mod error;
mod pipeline;
mod sdk;

use anyhow::Result;
use clap::Parser;
use contracts::AppConfig;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_devices, run_scan, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = config::load_config(cli.config_path().map(|p| p.as_path()))?;
    if let Commands::Run(args) = &cli.command {
        config::apply_run_overrides(&mut config, args)?;
    }

    init_observability(&cli, &config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        native_sdk = cfg!(feature = "livox-sdk"),
        "Livox Scan starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_scan(args, config).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Devices(args) => run_devices(args, config).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging (and metrics for `run`) from config plus CLI flags
fn init_observability(cli: &Cli, config: &AppConfig) -> Result<()> {
    let mut settings = ObservabilityConfig::from(config);

    if let Some(format) = cli.log_format {
        settings.log_format = format.into();
    }
    if let Some(level) = cli.log_level() {
        settings.default_log_level = level.to_string();
    }
    if !matches!(cli.command, Commands::Run(_)) {
        settings.metrics_port = None;
    }

    observability::init_with_config(settings)
}
