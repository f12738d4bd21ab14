//! Configuration loading and CLI overrides.

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::AppConfig;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};

/// Load the configuration file, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }

    Ok(ConfigLoader::load_from_path(path)?)
}

/// Apply `run` flags on top of the file configuration and re-validate
pub fn apply_run_overrides(config: &mut AppConfig, args: &RunArgs) -> Result<()> {
    if let Some(capacity) = args.point_capacity {
        config.scanner.point_channel_capacity = capacity;
    }
    if let Some(capacity) = args.event_capacity {
        config.scanner.event_channel_capacity = capacity;
    }
    if let Some(port) = args.metrics_port {
        config.metrics.port = Some(port);
    }
    if let Some(devices) = args.sim_devices {
        config.simulation.devices = devices;
    }
    if let Some(points) = args.sim_points {
        config.simulation.points_per_batch = points;
    }
    if let Some(rate) = args.sim_rate {
        config.simulation.rate_hz = rate;
    }

    ConfigLoader::validate(config)?;
    Ok(())
}
