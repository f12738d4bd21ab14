//! Scan session orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{stop_scanner, ScanSession, SessionConfig};
pub use stats::{RunStats, StopReason};
