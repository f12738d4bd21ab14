//! Scanner - SDK ingestion façade
//!
//! Owns the registry and both streams, drives the SDK lifecycle and hands
//! out receive-only views. Lifecycle: `Idle → Running → Stopped`, where
//! `Stopped` is terminal.
//!
//! The SDK's callback registration is process-global: only one scanner can
//! be running at a time. Starting a second one fails with
//! [`ScannerError::AlreadyBound`] and leaves both untouched.

use std::sync::Arc;

use async_channel::Receiver;
use contracts::{DeviceEvent, DeviceIdentity, LivoxSdk, PointCloudBatch, ScannerConfig};
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::binding;
use crate::callbacks::{DEVICE_CALLBACK, POINT_CALLBACK};
use crate::error::{Result, ScannerError, ScannerState};
use crate::metrics::MetricsSnapshot;
use crate::pipeline::Pipeline;

/// Ingestion front end for one SDK instance
pub struct Scanner {
    sdk: Arc<dyn LivoxSdk>,
    config: ScannerConfig,
    pipeline: Arc<Pipeline>,
    state: ScannerState,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Create an idle scanner
    ///
    /// Streams exist from construction, so consumers may start waiting
    /// before [`start`](Self::start).
    pub fn new(sdk: Arc<dyn LivoxSdk>, config: ScannerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ScannerError::InvalidConfig {
                message: e.to_string(),
            })?;

        let pipeline = Arc::new(Pipeline::new(
            config.point_channel_capacity,
            config.event_channel_capacity,
        ));

        Ok(Self {
            sdk,
            config,
            pipeline,
            state: ScannerState::Idle,
        })
    }

    /// Create with default event capacity and the given point capacity
    pub fn with_capacity(sdk: Arc<dyn LivoxSdk>, point_channel_capacity: usize) -> Result<Self> {
        Self::new(sdk, ScannerConfig::with_point_capacity(point_channel_capacity))
    }

    /// Bind to the SDK and start receiving callbacks
    ///
    /// On SDK initialization failure the scanner stays `Idle` and may be
    /// started again.
    #[instrument(name = "scanner_start", skip(self))]
    pub fn start(&mut self) -> Result<()> {
        if self.state != ScannerState::Idle {
            return Err(ScannerError::invalid_state("start", self.state));
        }

        binding::bind(&self.pipeline)?;

        let status = self.sdk.init();
        if !status.is_success() {
            binding::unbind(&self.pipeline);
            warn!(code = status.code(), "sdk initialization failed");
            return Err(ScannerError::SdkInit {
                code: status.code(),
            });
        }

        self.pipeline.coordinator.activate();
        self.sdk.register_point_callback(POINT_CALLBACK);
        self.sdk.register_device_callback(DEVICE_CALLBACK);
        self.state = ScannerState::Running;

        info!(
            point_capacity = self.config.point_channel_capacity,
            event_capacity = self.config.event_channel_capacity,
            "scanner started"
        );
        Ok(())
    }

    /// Stop the SDK and close both streams
    ///
    /// Blocks until every callback that entered before the stop signal has
    /// returned. Afterwards neither the registry nor the streams change;
    /// consumers drain what is queued and then see end-of-stream.
    #[instrument(name = "scanner_stop", skip(self))]
    pub fn stop(&mut self) -> Result<()> {
        if self.state != ScannerState::Running {
            return Err(ScannerError::invalid_state("stop", self.state));
        }

        self.pipeline.coordinator.begin_shutdown();
        self.sdk.stop();
        self.pipeline.coordinator.wait_idle();
        self.pipeline.close_streams();
        binding::unbind(&self.pipeline);
        self.state = ScannerState::Stopped;

        let metrics = self.pipeline.snapshot();
        info!(
            batches = metrics.batches_received,
            batches_dropped = metrics.batches_dropped,
            events = metrics.events_received,
            events_dropped = metrics.events_dropped,
            "scanner stopped"
        );
        Ok(())
    }

    /// Receive-only view of decoded point batches
    pub fn point_cloud_stream(&self) -> Receiver<PointCloudBatch> {
        self.pipeline.points.receiver()
    }

    /// Receive-only view of device connect / disconnect events
    pub fn device_event_stream(&self) -> Receiver<DeviceEvent> {
        self.pipeline.events.receiver()
    }

    /// Devices currently connected, ordered by handle
    pub fn current_devices(&self) -> Vec<DeviceIdentity> {
        self.pipeline.registry.snapshot()
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Pipeline counters, including per-stream drop counts
    pub fn metrics(&self) -> MetricsSnapshot {
        self.pipeline.snapshot()
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        if self.state == ScannerState::Running {
            debug!("dropping running scanner, stopping");
            if let Err(e) = self.stop() {
                error!(error = %e, "failed to stop scanner on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DualExtendRawPoint, ExtendRawPoint, RawPoint, TripleExtendRawPoint};
    use crate::mock::MockSdk;
    use contracts::SdkStatus;

    #[test]
    fn test_lifecycle() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 8).unwrap();
        assert_eq!(scanner.state(), ScannerState::Idle);

        scanner.start().unwrap();
        assert_eq!(scanner.state(), ScannerState::Running);
        assert!(sdk.is_initialized());
        assert!(binding::is_bound());

        let err = scanner.start().unwrap_err();
        assert!(err.is_precondition());

        scanner.stop().unwrap();
        assert_eq!(scanner.state(), ScannerState::Stopped);
        assert_eq!(sdk.stop_calls(), 1);
        assert!(!binding::is_bound());

        assert!(matches!(
            scanner.stop(),
            Err(ScannerError::InvalidState {
                operation: "stop",
                state: ScannerState::Stopped
            })
        ));
        assert!(matches!(
            scanner.start(),
            Err(ScannerError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_stop_from_idle_rejected() {
        let _lock = binding::test_lock();
        let mut scanner = Scanner::with_capacity(Arc::new(MockSdk::new()), 1).unwrap();
        assert!(scanner.stop().unwrap_err().is_precondition());
        assert_eq!(scanner.state(), ScannerState::Idle);
    }

    #[test]
    fn test_init_failure_returns_to_idle() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::failing(SdkStatus(2)));
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();

        assert!(matches!(scanner.start(), Err(ScannerError::SdkInit { code: 2 })));
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert!(!binding::is_bound());
        assert!(!sdk.has_callbacks());

        sdk.set_init_status(SdkStatus::SUCCESS);
        scanner.start().unwrap();
        assert_eq!(sdk.init_calls(), 2);
        scanner.stop().unwrap();
    }

    #[test]
    fn test_second_scanner_cannot_bind() {
        let _lock = binding::test_lock();
        let mut first = Scanner::with_capacity(Arc::new(MockSdk::new()), 4).unwrap();
        let second_sdk = Arc::new(MockSdk::new());
        let mut second = Scanner::with_capacity(second_sdk.clone(), 4).unwrap();

        first.start().unwrap();
        assert!(matches!(second.start(), Err(ScannerError::AlreadyBound)));
        assert_eq!(second.state(), ScannerState::Idle);
        assert_eq!(second_sdk.init_calls(), 0);

        first.stop().unwrap();
        second.start().unwrap();
        second.stop().unwrap();
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Scanner::with_capacity(Arc::new(MockSdk::new()), 0).unwrap_err();
        assert!(matches!(err, ScannerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_callbacks_before_start_are_ignored() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();

        // nothing registered yet
        sdk.emit_device(1, "AB12", true);
        assert!(scanner.current_devices().is_empty());

        scanner.start().unwrap();
        sdk.emit_device(1, "AB12", true);
        sdk.emit_points(1, &[RawPoint::new(1, 2, 3, 4)]);
        scanner.stop().unwrap();

        // SDK still holds the entry points but the pipeline is unbound
        sdk.emit_device(2, "CD34", true);
        assert_eq!(scanner.current_devices(), vec![DeviceIdentity::new(1, "AB12")]);
        assert_eq!(scanner.metrics().batches_received, 1);
        assert_eq!(scanner.metrics().events_received, 1);
    }

    #[test]
    fn test_drop_stops_running_scanner() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let rx = {
            let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
            scanner.start().unwrap();
            scanner.point_cloud_stream()
        };
        assert_eq!(sdk.stop_calls(), 1);
        assert!(!binding::is_bound());
        assert!(rx.recv_blocking().is_err());
    }

    #[test]
    fn test_stream_closed_after_stop() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();
        let events = scanner.device_event_stream();

        scanner.start().unwrap();
        sdk.emit_points(0, &[RawPoint::default(); 3]);
        sdk.emit_device(0, "XY", false);
        scanner.stop().unwrap();

        assert_eq!(points.recv_blocking().unwrap().len(), 3);
        assert!(points.recv_blocking().is_err());
        assert!(!events.recv_blocking().unwrap().connected);
        assert!(events.recv_blocking().is_err());
    }

    #[test]
    fn test_extended_records_through_callback() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        scanner.start().unwrap();
        sdk.emit_extended_points(
            3,
            &[
                ExtendRawPoint::new(1000, -2000, 500, 255, 0x10),
                ExtendRawPoint::new(-1, 0, 1, 0, 0),
                ExtendRawPoint::new(250, 250, 250, 51, 0x20),
            ],
        );
        scanner.stop().unwrap();

        let batch = points.recv_blocking().unwrap();
        assert_eq!(batch.handle, 3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.points[0].x, 1.0);
        assert_eq!(batch.points[0].y, -2.0);
        assert_eq!(batch.points[0].z, 0.5);
        assert_eq!(batch.points[0].intensity, 1.0);
        assert_eq!(batch.points[1].x, -0.001);
        assert_eq!(batch.points[2].intensity, 0.2);
        assert_eq!(scanner.metrics().unsupported_batches, 0);
    }

    #[test]
    fn test_dual_return_records_through_callback() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        let records = [
            DualExtendRawPoint {
                returns: [
                    ExtendRawPoint::new(1000, 0, 0, 255, 0),
                    ExtendRawPoint::new(3000, 0, 0, 0, 0),
                ],
            },
            DualExtendRawPoint {
                returns: [
                    ExtendRawPoint::new(0, 1500, 0, 51, 0),
                    ExtendRawPoint::new(0, 2500, 0, 102, 0),
                ],
            },
        ];
        scanner.start().unwrap();
        sdk.emit_records(1, &records);
        scanner.stop().unwrap();

        let batch = points.recv_blocking().unwrap();
        assert_eq!(batch.handle, 1);
        let xs: Vec<f32> = batch.points.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = batch.points.iter().map(|p| p.y).collect();
        assert_eq!(xs, vec![1.0, 3.0, 0.0, 0.0]);
        assert_eq!(ys, vec![0.0, 0.0, 1.5, 2.5]);
        assert_eq!(batch.points[0].intensity, 1.0);
        assert_eq!(batch.points[3].intensity, 0.4);
        assert!(points.recv_blocking().is_err());

        let metrics = scanner.metrics();
        assert_eq!(metrics.batches_received, 1);
        assert_eq!(metrics.unsupported_batches, 0);
    }

    #[test]
    fn test_triple_return_records_through_callback() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        let record = TripleExtendRawPoint {
            returns: [
                ExtendRawPoint::new(-1000, 0, 0, 0, 0),
                ExtendRawPoint::new(-2000, 0, 0, 0, 0),
                ExtendRawPoint::new(-4000, 0, 0, 0, 0),
            ],
        };
        let mut bytes = bytemuck::bytes_of(&record).to_vec();
        assert_eq!(bytes.len(), 42);

        scanner.start().unwrap();
        sdk.emit_raw(2, 7, &mut bytes, 1);
        scanner.stop().unwrap();

        let batch = points.recv_blocking().unwrap();
        assert_eq!(batch.handle, 2);
        let xs: Vec<f32> = batch.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-1.0, -2.0, -4.0]);
        assert_eq!(scanner.metrics().unsupported_batches, 0);
    }

    #[test]
    fn test_spherical_records_still_discarded() {
        let _lock = binding::test_lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        scanner.start().unwrap();
        // dual spherical: two 10-byte returns per record
        sdk.emit_raw(0, 5, &mut [0u8; 20], 1);
        scanner.stop().unwrap();

        assert!(points.recv_blocking().is_err());
        assert_eq!(scanner.metrics().unsupported_batches, 1);
    }
}
