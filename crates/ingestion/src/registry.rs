//! Device registry
//!
//! Handle → broadcast code map shared between the SDK callback thread
//! (writer) and consumer threads (readers). Locks cover only the map.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use contracts::{DeviceHandle, DeviceIdentity};
use tracing::trace;

/// Currently connected devices
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceHandle, String>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `handle` connected with `code`
    ///
    /// Returns the previous code if the handle was already present.
    pub fn upsert(&self, handle: DeviceHandle, code: impl Into<String>) -> Option<String> {
        let code = code.into();
        trace!(handle, code = %code, "registry upsert");
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, code)
    }

    /// Mark `handle` disconnected
    pub fn remove(&self, handle: DeviceHandle) -> Option<String> {
        trace!(handle, "registry remove");
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
    }

    /// Copy of the current contents, ordered by handle
    pub fn snapshot(&self) -> Vec<DeviceIdentity> {
        let mut devices: Vec<DeviceIdentity> = {
            let guard = self.devices.read().unwrap_or_else(PoisonError::into_inner);
            guard
                .iter()
                .map(|(handle, code)| DeviceIdentity::new(*handle, code.clone()))
                .collect()
        };
        devices.sort_unstable_by_key(|d| d.handle);
        devices
    }

    /// Broadcast code of `handle`, if connected
    pub fn get(&self, handle: DeviceHandle) -> Option<String> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
