//! Mock SDK
//!
//! Stands in for the native SDK in tests and hardware-less runs. Registered
//! callbacks are invoked through raw pointers exactly as the native SDK
//! would, so the full C-ABI boundary is exercised.

use std::ffi::CString;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{
    DeviceHandle, DeviceInfoCallback, LivoxSdk, PointCloudCallback, SdkStatus,
    BROADCAST_CODE_SIZE, MAX_DEVICE_COUNT,
};
use tracing::{debug, trace};

use crate::decoder::{ExtendRawPoint, RawPoint, RawRecord};

/// Synthetic data generation settings
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Devices announced after callbacks are registered
    pub devices: u8,

    /// Records per point delivery
    pub points_per_batch: u32,

    /// Deliveries per device per second
    pub rate_hz: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            devices: 1,
            points_per_batch: 100,
            rate_hz: 10.0,
        }
    }
}

#[derive(Default)]
struct Callbacks {
    point: Mutex<Option<PointCloudCallback>>,
    device: Mutex<Option<DeviceInfoCallback>>,
}

impl Callbacks {
    fn point(&self) -> Option<PointCloudCallback> {
        *self.point.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn device(&self) -> Option<DeviceInfoCallback> {
        *self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_device(&self, handle: DeviceHandle, code: &str, connected: bool) {
        let Some(callback) = self.device() else {
            trace!(handle, "no device callback registered");
            return;
        };
        // The SDK hands out a fixed 16-byte, NUL-terminated buffer
        let code: String = code
            .chars()
            .filter(|c| *c != '\0')
            .take(BROADCAST_CODE_SIZE - 1)
            .collect();
        let code = CString::new(code).unwrap_or_default();
        // SAFETY: `code` is NUL-terminated and outlives the call.
        unsafe { callback(handle, code.as_ptr().cast_mut(), u8::from(connected)) };
    }

    fn emit_samples<S: RawRecord>(&self, handle: DeviceHandle, samples: &[S]) {
        let Some(callback) = self.point() else {
            trace!(handle, "no point callback registered");
            return;
        };
        let mut buffer = samples.to_vec();
        // SAFETY: `buffer` holds `len` records of the advertised layout and
        // outlives the call.
        unsafe {
            callback(
                handle,
                buffer.as_mut_ptr().cast(),
                buffer.len() as u32,
                u8::from(S::DATA_TYPE),
            )
        };
    }

    fn emit_raw(&self, handle: DeviceHandle, data_type: u8, bytes: &mut [u8], data_num: u32) {
        if let Some(callback) = self.point() {
            // SAFETY: the test supplies a buffer consistent with `data_num`.
            unsafe { callback(handle, bytes.as_mut_ptr(), data_num, data_type) };
        }
    }
}

struct Worker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// In-process SDK double
///
/// Callbacks stay registered across `stop()`, like the native wrapper, so
/// late deliveries can be injected after shutdown.
pub struct MockSdk {
    callbacks: Arc<Callbacks>,
    init_status: Mutex<SdkStatus>,
    init_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    initialized: AtomicBool,
    simulation: Option<SimulationConfig>,
    worker: Mutex<Option<Worker>>,
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSdk {
    /// SDK whose `init` succeeds
    pub fn new() -> Self {
        Self {
            callbacks: Arc::new(Callbacks::default()),
            init_status: Mutex::new(SdkStatus::SUCCESS),
            init_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            initialized: AtomicBool::new(false),
            simulation: None,
            worker: Mutex::new(None),
        }
    }

    /// SDK whose `init` reports `status`
    pub fn failing(status: SdkStatus) -> Self {
        let sdk = Self::new();
        sdk.set_init_status(status);
        sdk
    }

    /// SDK that generates synthetic devices and points while initialized
    pub fn simulated(config: SimulationConfig) -> Self {
        let mut sdk = Self::new();
        sdk.simulation = Some(config);
        sdk
    }

    pub fn set_init_status(&self, status: SdkStatus) {
        *self
            .init_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Invoke the device callback
    pub fn emit_device(&self, handle: DeviceHandle, code: &str, connected: bool) {
        self.callbacks.emit_device(handle, code, connected);
    }

    /// Invoke the point callback with cartesian records
    pub fn emit_points(&self, handle: DeviceHandle, samples: &[RawPoint]) {
        self.callbacks.emit_samples(handle, samples);
    }

    /// Invoke the point callback with extended cartesian records
    pub fn emit_extended_points(&self, handle: DeviceHandle, samples: &[ExtendRawPoint]) {
        self.callbacks.emit_samples(handle, samples);
    }

    /// Invoke the point callback with records of any cartesian layout
    pub fn emit_records<S: RawRecord>(&self, handle: DeviceHandle, samples: &[S]) {
        self.callbacks.emit_samples(handle, samples);
    }

    /// Invoke the point callback with an arbitrary buffer
    pub fn emit_raw(&self, handle: DeviceHandle, data_type: u8, bytes: &mut [u8], data_num: u32) {
        self.callbacks.emit_raw(handle, data_type, bytes, data_num);
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Whether both callbacks have been registered
    pub fn has_callbacks(&self) -> bool {
        self.callbacks.point().is_some() && self.callbacks.device().is_some()
    }

    fn spawn_simulation(&self, config: SimulationConfig) {
        let running = Arc::new(AtomicBool::new(true));
        let callbacks = self.callbacks.clone();
        let flag = running.clone();

        let handle = thread::spawn(move || simulate(&callbacks, &flag, &config));

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Worker { running, handle });
    }
}

impl LivoxSdk for MockSdk {
    fn init(&self) -> SdkStatus {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let status = *self
            .init_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !status.is_success() {
            return status;
        }

        self.initialized.store(true, Ordering::SeqCst);
        if let Some(config) = self.simulation.clone() {
            self.spawn_simulation(config);
        }
        debug!("mock sdk initialized");
        status
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.running.store(false, Ordering::SeqCst);
            if worker.handle.join().is_err() {
                debug!("mock simulation thread panicked");
            }
        }
        self.initialized.store(false, Ordering::SeqCst);
        debug!("mock sdk stopped");
    }

    fn register_point_callback(&self, callback: PointCloudCallback) {
        *self
            .callbacks
            .point
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn register_device_callback(&self, callback: DeviceInfoCallback) {
        *self
            .callbacks
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }
}

impl Drop for MockSdk {
    fn drop(&mut self) {
        if let Some(worker) = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            worker.running.store(false, Ordering::SeqCst);
            let _ = worker.handle.join();
        }
    }
}

fn simulate(callbacks: &Callbacks, running: &AtomicBool, config: &SimulationConfig) {
    let interval = Duration::from_secs_f64(1.0 / config.rate_hz.max(f64::EPSILON));
    let devices = config.devices.min(MAX_DEVICE_COUNT);
    let mut announced = false;
    let mut frame: u64 = 0;

    debug!(
        devices,
        points_per_batch = config.points_per_batch,
        rate_hz = config.rate_hz,
        "mock simulation started"
    );

    while running.load(Ordering::Relaxed) {
        if !announced && callbacks.device().is_some() {
            for handle in 0..devices {
                callbacks.emit_device(handle, &broadcast_code(handle), true);
            }
            announced = true;
        }

        for handle in 0..devices {
            let samples = synthetic_scan(handle, frame, config.points_per_batch);
            callbacks.emit_samples(handle, &samples);
        }

        frame += 1;
        thread::sleep(interval);
    }

    debug!(frames = frame, "mock simulation stopped");
}

/// Broadcast code for a simulated device
pub fn broadcast_code(handle: DeviceHandle) -> String {
    format!("SIM{:011}", handle)
}

/// One rotating ring of points around a simulated device
pub fn synthetic_scan(handle: DeviceHandle, frame: u64, count: u32) -> Vec<RawPoint> {
    let radius = 5_000.0 + f64::from(handle) * 1_000.0;
    let phase = frame as f64 * 0.05;

    (0..count)
        .map(|i| {
            let angle = phase + std::f64::consts::TAU * f64::from(i) / f64::from(count.max(1));
            RawPoint::new(
                (radius * angle.cos()) as i32,
                (radius * angle.sin()) as i32,
                (i % 16) as i32 * 50 - 400,
                (i.wrapping_mul(7) % 256) as u8,
            )
        })
        .collect()
}
