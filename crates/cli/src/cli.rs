//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Livox Scan - point cloud ingestion for Livox LiDAR devices
#[derive(Parser, Debug)]
#[command(
    name = "livox-scan",
    author,
    version,
    about = "Livox LiDAR point cloud ingestion",
    long_about = "Bridges the Livox SDK's callbacks into bounded point cloud and device \n\
                  event streams. Without the `livox-sdk` feature a simulated SDK \n\
                  generates synthetic devices and scans."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LIVOX_SCAN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (overrides `[logging] format`)
    #[arg(long, value_enum, global = true, env = "LIVOX_SCAN_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration file the selected command reads, if any
    pub fn config_path(&self) -> Option<&PathBuf> {
        match &self.command {
            Commands::Run(args) => args.config.as_ref(),
            Commands::Devices(args) => args.config.as_ref(),
            Commands::Validate(_) => None,
        }
    }

    /// Log level implied by `-v` / `-q`, if any
    pub fn log_level(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("warn");
        }
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the scanner and consume both streams
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Discover devices for a while and print the registry
    Devices(DevicesArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "LIVOX_SCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override `scanner.point_channel_capacity`
    #[arg(long, env = "LIVOX_SCAN_POINT_CAPACITY")]
    pub point_capacity: Option<usize>,

    /// Override `scanner.event_channel_capacity`
    #[arg(long, env = "LIVOX_SCAN_EVENT_CAPACITY")]
    pub event_capacity: Option<usize>,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "LIVOX_SCAN_DURATION")]
    pub duration: u64,

    /// Stop after consuming this many batches (0 = unlimited)
    #[arg(long, default_value = "0", env = "LIVOX_SCAN_MAX_BATCHES")]
    pub max_batches: u64,

    /// Prometheus port (overrides `[metrics] port`)
    #[arg(long, env = "LIVOX_SCAN_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Simulated device count
    #[arg(long, env = "LIVOX_SCAN_SIM_DEVICES")]
    pub sim_devices: Option<u8>,

    /// Simulated points per batch
    #[arg(long, env = "LIVOX_SCAN_SIM_POINTS")]
    pub sim_points: Option<u32>,

    /// Simulated batches per device per second
    #[arg(long, env = "LIVOX_SCAN_SIM_RATE")]
    pub sim_rate: Option<f64>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "livox-scan.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `devices` command
#[derive(Parser, Debug)]
pub struct DevicesArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "LIVOX_SCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds to wait for discovery
    #[arg(long, default_value = "3")]
    pub wait: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
