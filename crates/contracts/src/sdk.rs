//! LivoxSdk trait - external SDK abstraction
//!
//! The hardware SDK owns device discovery, the connection protocol and the
//! threads that deliver data. This crate only describes the surface the
//! ingestion pipeline drives:
//!
//! 1. **Lifecycle**: `init` / `stop` are synchronous and authoritative for
//!    whether the hardware layer is active
//! 2. **Process-global callbacks**: registration is not instance-scoped, so
//!    at most one consumer may be bound to the SDK at a time
//! 3. **Borrowed buffers**: pointers handed to a callback are only valid
//!    until that callback returns

use std::fmt;
use std::os::raw::c_char;

/// Point delivery entry point: `(handle, data, data_num, data_type)`
///
/// `data` points at `data_num` packed records whose layout is selected by
/// `data_type`.
pub type PointCloudCallback =
    unsafe extern "C" fn(handle: u8, data: *mut u8, data_num: u32, data_type: u8);

/// Device info entry point: `(handle, broadcast_code, connected)`
///
/// `broadcast_code` is a NUL-terminated string, `connected` is 0 or 1.
pub type DeviceInfoCallback =
    unsafe extern "C" fn(handle: u8, broadcast_code: *mut c_char, connected: u8);

/// Status code returned by SDK initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdkStatus(pub u32);

impl SdkStatus {
    /// Initialization succeeded
    pub const SUCCESS: Self = Self(0);

    /// Whether the status reports success
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Raw status code
    pub fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SdkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External hardware SDK
///
/// Implemented by the native binding and by test doubles.
///
/// # Example
///
/// ```ignore
/// let sdk: Arc<dyn LivoxSdk> = Arc::new(NativeSdk::new());
/// if !sdk.init().is_success() {
///     // hardware layer unavailable
/// }
/// sdk.register_point_callback(on_points);
/// sdk.register_device_callback(on_device);
/// // ... callbacks fire on SDK threads ...
/// sdk.stop();
/// ```
pub trait LivoxSdk: Send + Sync {
    /// Initialize the SDK and start device discovery
    fn init(&self) -> SdkStatus;

    /// Halt delivery and tear the SDK down
    ///
    /// Once this returns no callback may start.
    fn stop(&self);

    /// Install the process-wide point delivery callback
    fn register_point_callback(&self, callback: PointCloudCallback);

    /// Install the process-wide device info callback
    fn register_device_callback(&self, callback: DeviceInfoCallback);
}
