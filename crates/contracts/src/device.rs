//! Device contracts

use std::fmt;

use serde::{Deserialize, Serialize};

/// SDK slot number of a connected device
///
/// Reused by the SDK only after a disconnect for the same slot.
pub type DeviceHandle = u8;

/// Size of the SDK's broadcast code buffer, including the NUL terminator
pub const BROADCAST_CODE_SIZE: usize = 16;

/// Identity of a connected device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// SDK slot
    pub handle: DeviceHandle,

    /// Broadcast code reported during discovery
    pub broadcast_code: String,
}

impl DeviceIdentity {
    /// Create a new identity
    pub fn new(handle: DeviceHandle, broadcast_code: impl Into<String>) -> Self {
        Self {
            handle,
            broadcast_code: broadcast_code.into(),
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.broadcast_code, self.handle)
    }
}

/// Registry transition
///
/// Describes a change, not the registry state itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Device the transition applies to
    pub device: DeviceIdentity,

    /// `true` for connect / state change, `false` for disconnect
    pub connected: bool,
}
