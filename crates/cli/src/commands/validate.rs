//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AppConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    point_channel_capacity: usize,
    event_channel_capacity: usize,
    log_format: String,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
    simulated_devices: u8,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    point_channel_capacity: config.scanner.point_channel_capacity,
                    event_channel_capacity: config.scanner.event_channel_capacity,
                    log_format: format!("{:?}", config.logging.format),
                    log_level: config.logging.level.clone(),
                    metrics_port: config.metrics.port,
                    simulated_devices: config.simulation.devices,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // One connect event per simulated device arrives in a burst
    if config.scanner.event_channel_capacity < usize::from(config.simulation.devices) {
        warnings.push(format!(
            "scanner.event_channel_capacity ({}) is below simulation.devices ({}) - connect events may be dropped",
            config.scanner.event_channel_capacity, config.simulation.devices
        ));
    }

    // Per-device batch rate against a consumer that stalls for one second
    let batches_per_sec = config.simulation.rate_hz * f64::from(config.simulation.devices);
    if (config.scanner.point_channel_capacity as f64) < batches_per_sec {
        warnings.push(format!(
            "scanner.point_channel_capacity ({}) holds less than one second of simulated batches ({:.0}/s)",
            config.scanner.point_channel_capacity, batches_per_sec
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!(
                "\n  Point channel capacity: {}",
                summary.point_channel_capacity
            );
            println!("  Event channel capacity: {}", summary.event_channel_capacity);
            println!("  Logging: {} ({})", summary.log_level, summary.log_format);
            match summary.metrics_port {
                Some(port) => println!("  Metrics port: {}", port),
                None => println!("  Metrics: disabled"),
            }
            println!("  Simulated devices: {}", summary.simulated_devices);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
