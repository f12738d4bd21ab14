//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only, never the other way round.
//!
//! ## Units
//! - Point coordinates are meters (`f32`), intensity is normalized to `[0, 1]`
//! - Device handles are the SDK's `u8` slot numbers

mod config;
mod device;
mod error;
mod point;
mod sdk;

pub use config::{
    AppConfig, LogFormat, LoggingConfig, MetricsConfig, ScannerConfig, SimulationSettings,
    DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_POINT_CHANNEL_CAPACITY, MAX_DEVICE_COUNT,
};
pub use device::{DeviceEvent, DeviceHandle, DeviceIdentity, BROADCAST_CODE_SIZE};
pub use error::ContractError;
pub use point::{DataType, Point, PointCloudBatch};
pub use sdk::{DeviceInfoCallback, LivoxSdk, PointCloudCallback, SdkStatus};
