//! Native Livox SDK binding
//!
//! Thin wrapper over the C shim (`livox_wrapper`) that owns discovery,
//! connection and sampling. Only compiled with the `livox-sdk` feature.

use contracts::{DeviceInfoCallback, LivoxSdk, PointCloudCallback, SdkStatus};
use tracing::{debug, warn};

mod ffi {
    use contracts::{DeviceInfoCallback, PointCloudCallback};

    extern "C" {
        pub fn InitSdk() -> u32;
        pub fn StopSdk() -> u32;
        pub fn RegisterPointCloudCallback(cb: Option<PointCloudCallback>);
        pub fn RegisterDeviceInfoCallback(cb: Option<DeviceInfoCallback>);
    }
}

/// Handle to the process-wide native SDK
#[derive(Debug, Default)]
pub struct NativeSdk {
    _private: (),
}

impl NativeSdk {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LivoxSdk for NativeSdk {
    fn init(&self) -> SdkStatus {
        // SAFETY: no preconditions; the shim reports failure via status.
        let status = SdkStatus(unsafe { ffi::InitSdk() });
        if status.is_success() {
            debug!("native sdk initialized");
        } else {
            warn!(code = status.code(), "native sdk initialization failed");
        }
        status
    }

    fn stop(&self) {
        // SAFETY: Uninit joins the SDK's worker threads before returning.
        let code = unsafe { ffi::StopSdk() };
        debug!(code, "native sdk stopped");
    }

    fn register_point_callback(&self, callback: PointCloudCallback) {
        // SAFETY: `callback` is a 'static function with the shim's signature.
        unsafe { ffi::RegisterPointCloudCallback(Some(callback)) };
    }

    fn register_device_callback(&self, callback: DeviceInfoCallback) {
        // SAFETY: as above.
        unsafe { ffi::RegisterDeviceInfoCallback(Some(callback)) };
    }
}
