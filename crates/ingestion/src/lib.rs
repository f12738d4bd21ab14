//! # Ingestion
//!
//! Bridges the Livox SDK's thread-unsafe callbacks into concurrency-safe
//! streams.
//!
//! Responsibilities:
//! - Decode packed SDK point records into `PointCloudBatch`
//! - Maintain the connected-device registry
//! - Backpressure: bounded streams that drop the newest item when full
//! - Deterministic shutdown: no registry or stream mutation after `stop()`
//!
//! Only one [`Scanner`] can be running per process because the SDK's
//! callback registration is global.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ingestion::{MockSdk, Scanner};
//!
//! let sdk = Arc::new(MockSdk::new());
//! let mut scanner = Scanner::with_capacity(sdk, 100)?;
//! let points = scanner.point_cloud_stream();
//!
//! scanner.start()?;
//! while let Ok(batch) = points.recv().await {
//!     // Process batch
//! }
//! scanner.stop()?;
//! ```

mod binding;
mod callbacks;
mod decoder;
mod error;
mod metrics;
mod mock;
#[cfg(feature = "livox-sdk")]
mod native;
mod pipeline;
mod registry;
mod scanner;
mod shutdown;
mod stream;

// Re-exports
pub use async_channel::{Receiver, RecvError};
pub use binding::is_bound;
pub use callbacks::{on_device_info, on_point_cloud};
pub use contracts::{DeviceEvent, DeviceIdentity, Point, PointCloudBatch, ScannerConfig};
pub use decoder::{
    decode_buffer, decode_point, decode_samples, record_size, DualExtendRawPoint, ExtendRawPoint,
    RawPoint, RawRecord, RawSample, TripleExtendRawPoint,
};
pub use error::{Result, ScannerError, ScannerState};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{broadcast_code, synthetic_scan, MockSdk, SimulationConfig};
#[cfg(feature = "livox-sdk")]
pub use native::NativeSdk;
pub use registry::DeviceRegistry;
pub use scanner::Scanner;
pub use shutdown::{InFlight, ShutdownCoordinator};
pub use stream::{BoundedStream, SendOutcome};
