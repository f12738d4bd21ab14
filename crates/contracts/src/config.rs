//! Scanner configuration contract

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default point-cloud channel capacity (batches)
pub const DEFAULT_POINT_CHANNEL_CAPACITY: usize = 100;

/// Default device event channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 10;

/// Scanner configuration
///
/// Both channels drop the newest item when full, so capacity is the knob
/// that trades memory for tolerance of a slow consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    /// Point-cloud batch channel capacity
    #[serde(default = "default_point_capacity")]
    #[validate(range(min = 1))]
    pub point_channel_capacity: usize,

    /// Device event channel capacity
    #[serde(default = "default_event_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,
}

fn default_point_capacity() -> usize {
    DEFAULT_POINT_CHANNEL_CAPACITY
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            point_channel_capacity: DEFAULT_POINT_CHANNEL_CAPACITY,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ScannerConfig {
    /// Create configuration with the given point channel capacity
    pub fn with_point_capacity(point_channel_capacity: usize) -> Self {
        Self {
            point_channel_capacity,
            ..Default::default()
        }
    }
}

/// Maximum devices the SDK tracks at once
pub const MAX_DEVICE_COUNT: u8 = 32;

/// Complete configuration file
///
/// ```toml
/// [scanner]
/// point_channel_capacity = 100
///
/// [logging]
/// format = "pretty"
/// level = "info"
///
/// [metrics]
/// port = 9000
///
/// [simulation]
/// devices = 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Ingestion pipeline settings
    #[serde(default)]
    #[validate(nested)]
    pub scanner: ScannerConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Prometheus exporter settings
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Synthetic device settings for hardware-less runs
    #[serde(default)]
    #[validate(nested)]
    pub simulation: SimulationSettings,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

/// Metrics exporter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus listen port (None = disabled)
    #[serde(default)]
    pub port: Option<u16>,
}

/// Simulated SDK configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationSettings {
    /// Simulated device count
    #[serde(default = "default_sim_devices")]
    #[validate(range(min = 1, max = 32))]
    pub devices: u8,

    /// Points per delivery
    #[serde(default = "default_sim_points")]
    #[validate(range(min = 1, max = 100000))]
    pub points_per_batch: u32,

    /// Deliveries per device per second
    #[serde(default = "default_sim_rate")]
    #[validate(range(exclusive_min = 0.0, max = 10000.0))]
    pub rate_hz: f64,
}

fn default_sim_devices() -> u8 {
    1
}

fn default_sim_points() -> u32 {
    100
}

fn default_sim_rate() -> f64 {
    10.0
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            devices: default_sim_devices(),
            points_per_batch: default_sim_points(),
            rate_hz: default_sim_rate(),
        }
    }
}
