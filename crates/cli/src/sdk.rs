//! SDK selection.

use std::sync::Arc;

use contracts::{LivoxSdk, SimulationSettings};
use tracing::info;

/// Native SDK driving real hardware
#[cfg(feature = "livox-sdk")]
pub fn build_sdk(_simulation: &SimulationSettings) -> Arc<dyn LivoxSdk> {
    info!("Using native Livox SDK");
    Arc::new(ingestion::NativeSdk::new())
}

/// Simulated SDK generating synthetic devices and scans
#[cfg(not(feature = "livox-sdk"))]
pub fn build_sdk(simulation: &SimulationSettings) -> Arc<dyn LivoxSdk> {
    info!(
        devices = simulation.devices,
        points_per_batch = simulation.points_per_batch,
        rate_hz = simulation.rate_hz,
        "Running in SIMULATION mode (no hardware required)"
    );
    Arc::new(ingestion::MockSdk::simulated(ingestion::SimulationConfig {
        devices: simulation.devices,
        points_per_batch: simulation.points_per_batch,
        rate_hz: simulation.rate_hz,
    }))
}
