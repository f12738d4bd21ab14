//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! Covers:
//! - Contract snapshots
//! - Scanner scenarios driven through the mock SDK's C-ABI entry points
//! - Backpressure, ordering and shutdown behaviour

#[cfg(test)]
mod contract_tests {
    use contracts::{DataType, ScannerConfig, DEFAULT_POINT_CHANNEL_CAPACITY};

    #[test]
    fn test_contracts_compile() {
        assert_eq!(DataType::from(0), DataType::Cartesian);
        assert_eq!(
            ScannerConfig::default().point_channel_capacity,
            DEFAULT_POINT_CHANNEL_CAPACITY
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::thread;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DeviceIdentity, ScannerConfig};
    use ingestion::{
        is_bound, DualExtendRawPoint, ExtendRawPoint, MockSdk, RawPoint, Scanner, SimulationConfig,
    };
    use observability::StreamStats;

    /// The SDK callback slot is process-wide; scanner tests run one at a time.
    static SCANNER_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> MutexGuard<'static, ()> {
        SCANNER_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tagged(seq: i32) -> RawPoint {
        RawPoint::new(seq, 0, 0, 0)
    }

    /// connect → snapshot → points → decode → disconnect → snapshot → stop
    #[test]
    fn test_e2e_connect_stream_disconnect() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 16).unwrap();
        let points = scanner.point_cloud_stream();
        let events = scanner.device_event_stream();

        scanner.start().unwrap();

        sdk.emit_device(1, "AB12", true);
        assert_eq!(
            scanner.current_devices(),
            vec![DeviceIdentity::new(1, "AB12")]
        );
        let event = events.recv_blocking().unwrap();
        assert!(event.connected);
        assert_eq!(event.device, DeviceIdentity::new(1, "AB12"));

        let samples = [
            RawPoint::new(1_000, -2_500, 0, 255),
            RawPoint::new(i32::MAX, i32::MIN, -1, 0),
            RawPoint::new(123, 456, 789, 51),
        ];
        sdk.emit_points(1, &samples);

        let batch = points.recv_blocking().unwrap();
        assert_eq!(batch.handle, 1);
        assert_eq!(batch.len(), 3);
        for (point, raw) in batch.points.iter().zip(samples.iter()) {
            let (x, y, z, r) = (raw.x, raw.y, raw.z, raw.reflectivity);
            assert_eq!(point.x, x as f32 / 1000.0);
            assert_eq!(point.y, y as f32 / 1000.0);
            assert_eq!(point.z, z as f32 / 1000.0);
            assert_eq!(point.intensity, f32::from(r) / 255.0);
        }
        assert_eq!(batch.points[0].intensity, 1.0);
        assert_eq!(batch.points[1].intensity, 0.0);

        sdk.emit_device(1, "AB12", false);
        assert!(scanner.current_devices().is_empty());
        assert!(!events.recv_blocking().unwrap().connected);

        scanner.stop().unwrap();
        assert!(points.recv_blocking().is_err());
        assert!(events.recv_blocking().is_err());
        assert!(!is_bound());
    }

    #[test]
    fn test_backpressure_keeps_oldest() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        scanner.start().unwrap();
        for seq in 0..10 {
            sdk.emit_points(7, &[tagged(seq)]);
        }

        let metrics = scanner.metrics();
        assert_eq!(metrics.batches_received, 10);
        assert_eq!(metrics.batches_dropped, 6);
        assert_eq!(metrics.point_queue_len, 4);

        scanner.stop().unwrap();

        let retained: Vec<f32> = std::iter::from_fn(|| points.recv_blocking().ok())
            .map(|batch| batch.points[0].x)
            .collect();
        assert_eq!(retained, vec![0.0, 0.001, 0.002, 0.003]);
    }

    #[test]
    fn test_registry_updated_when_event_dropped() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let config = ScannerConfig {
            point_channel_capacity: 4,
            event_channel_capacity: 2,
        };
        let mut scanner = Scanner::new(sdk.clone(), config).unwrap();

        scanner.start().unwrap();
        for handle in 0..5u8 {
            sdk.emit_device(handle, &format!("DEV{handle}"), true);
        }

        assert_eq!(scanner.current_devices().len(), 5);
        let metrics = scanner.metrics();
        assert_eq!(metrics.events_received, 5);
        assert_eq!(metrics.events_dropped, 3);
        scanner.stop().unwrap();
    }

    #[test]
    fn test_per_handle_order_preserved() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 256).unwrap();
        let points = scanner.point_cloud_stream();

        scanner.start().unwrap();

        let producers: Vec<_> = (0..3u8)
            .map(|handle| {
                let sdk = sdk.clone();
                thread::spawn(move || {
                    for seq in 0..60 {
                        sdk.emit_points(handle, &[tagged(seq)]);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        scanner.stop().unwrap();

        let mut last = [-1i32; 3];
        let mut count = 0;
        while let Ok(batch) = points.recv_blocking() {
            let seq = (batch.points[0].x * 1000.0).round() as i32;
            let handle = usize::from(batch.handle);
            assert!(seq > last[handle], "handle {handle}: {seq} after {}", last[handle]);
            last[handle] = seq;
            count += 1;
        }
        assert_eq!(count, 180);
        assert_eq!(last, [59, 59, 59]);
    }

    #[test]
    fn test_unsupported_data_type_discarded() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        scanner.start().unwrap();
        // one spherical record: u32 depth, u16 theta, u16 phi, u8 reflectivity
        let mut spherical = [0u8; 9];
        sdk.emit_raw(0, 1, &mut spherical, 1);
        sdk.emit_points(0, &[tagged(1)]);
        scanner.stop().unwrap();

        let metrics = scanner.metrics();
        assert_eq!(metrics.unsupported_batches, 1);
        assert_eq!(metrics.batches_received, 1);
        assert_eq!(points.recv_blocking().unwrap().len(), 1);
        assert!(points.recv_blocking().is_err());
    }

    #[test]
    fn test_dual_return_delivery_emits_batch() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 4).unwrap();
        let points = scanner.point_cloud_stream();

        let records = [
            DualExtendRawPoint {
                returns: [
                    ExtendRawPoint::new(1_000, 0, 0, 255, 0),
                    ExtendRawPoint::new(2_000, 0, 0, 0, 0),
                ],
            },
            DualExtendRawPoint {
                returns: [
                    ExtendRawPoint::new(3_000, 0, 0, 255, 0),
                    ExtendRawPoint::new(4_000, 0, 0, 0, 0),
                ],
            },
        ];

        scanner.start().unwrap();
        sdk.emit_records(1, &records);
        sdk.emit_points(1, &[tagged(5_000)]);
        scanner.stop().unwrap();

        let metrics = scanner.metrics();
        assert_eq!(metrics.batches_received, 2);
        assert_eq!(metrics.unsupported_batches, 0);

        let dual = points.recv_blocking().unwrap();
        let xs: Vec<f32> = dual.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(points.recv_blocking().unwrap().points[0].x, 5.0);
        assert!(points.recv_blocking().is_err());
    }

    #[test]
    fn test_shutdown_race() {
        let _lock = lock();
        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::with_capacity(sdk.clone(), 64).unwrap();
        let points = scanner.point_cloud_stream();

        scanner.start().unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let producers: Vec<_> = (0..4u8)
            .map(|handle| {
                let sdk = sdk.clone();
                let running = running.clone();
                thread::spawn(move || {
                    let mut seq = 0;
                    while running.load(Ordering::Relaxed) {
                        sdk.emit_points(handle, &[tagged(seq); 8]);
                        sdk.emit_device(handle, "RACE", seq % 2 == 0);
                        seq += 1;
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        scanner.stop().unwrap();

        let at_stop = scanner.metrics();
        let devices_at_stop = scanner.current_devices();

        // producers keep calling into the SDK after stop
        thread::sleep(Duration::from_millis(20));
        running.store(false, Ordering::Relaxed);
        for producer in producers {
            producer.join().unwrap();
        }

        let after = scanner.metrics();
        assert_eq!(after.batches_received, at_stop.batches_received);
        assert_eq!(after.batches_dropped, at_stop.batches_dropped);
        assert_eq!(after.events_received, at_stop.events_received);
        assert_eq!(scanner.current_devices(), devices_at_stop);

        let mut stats = StreamStats::new();
        while let Ok(batch) = points.recv_blocking() {
            stats.record_batch(&batch);
        }
        assert_eq!(
            stats.batches,
            at_stop.batches_received - at_stop.batches_dropped
        );
        assert_eq!(stats.points, stats.batches * 8);
    }

    #[test]
    fn test_config_file_drives_scanner() {
        let _lock = lock();
        let config = ConfigLoader::load_from_str(
            "[scanner]\npoint_channel_capacity = 2\nevent_channel_capacity = 1\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let sdk = Arc::new(MockSdk::new());
        let mut scanner = Scanner::new(sdk.clone(), config.scanner).unwrap();
        scanner.start().unwrap();
        for seq in 0..3 {
            sdk.emit_points(0, &[tagged(seq)]);
        }
        sdk.emit_device(0, "A", true);
        sdk.emit_device(1, "B", true);

        let metrics = scanner.metrics();
        assert_eq!(metrics.batches_dropped, 1);
        assert_eq!(metrics.events_dropped, 1);
        scanner.stop().unwrap();
    }

    #[test]
    fn test_simulated_sdk_end_to_end() {
        let _lock = lock();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let sdk = Arc::new(MockSdk::simulated(SimulationConfig {
            devices: 3,
            points_per_batch: 32,
            rate_hz: 100.0,
        }));
        let mut scanner = Scanner::with_capacity(sdk.clone(), 64).unwrap();
        let points = scanner.point_cloud_stream();
        let events = scanner.device_event_stream();

        let consumer = runtime.spawn(async move {
            let mut stats = StreamStats::new();
            while let Ok(batch) = points.recv().await {
                stats.record_batch(&batch);
            }
            while let Ok(event) = events.recv().await {
                stats.record_event(&event);
            }
            stats
        });

        scanner.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        scanner.stop().unwrap();

        let stats = runtime.block_on(consumer).unwrap();
        let metrics = scanner.metrics();
        assert!(stats.batches > 0);
        assert_eq!(stats.points, stats.batches * 32);
        assert_eq!(stats.connects, 3);
        assert_eq!(stats.per_device.len(), 3);
        assert_eq!(
            stats.batches,
            metrics.batches_received - metrics.batches_dropped
        );
        assert_eq!(scanner.current_devices().len(), 3);
        assert!(!sdk.is_initialized());
        assert!(scanner.stop().is_err());
    }
}
