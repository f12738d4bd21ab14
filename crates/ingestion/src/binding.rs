//! Process-wide binding slot
//!
//! The SDK registers callbacks globally, so the C-ABI entry points find
//! their target through a single "currently bound pipeline" slot. At most
//! one scanner may occupy it; binding a second one fails with
//! [`ScannerError::AlreadyBound`] until the first is stopped.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{Result, ScannerError};
use crate::pipeline::Pipeline;

static BOUND: RwLock<Option<Arc<Pipeline>>> = RwLock::new(None);

/// Occupy the slot with `pipeline`
pub(crate) fn bind(pipeline: &Arc<Pipeline>) -> Result<()> {
    let mut slot = BOUND.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(ScannerError::AlreadyBound);
    }
    *slot = Some(pipeline.clone());
    debug!("pipeline bound to sdk callbacks");
    Ok(())
}

/// Release the slot if `pipeline` occupies it
pub(crate) fn unbind(pipeline: &Arc<Pipeline>) -> bool {
    let mut slot = BOUND.write().unwrap_or_else(PoisonError::into_inner);
    match slot.as_ref() {
        Some(bound) if Arc::ptr_eq(bound, pipeline) => {
            *slot = None;
            debug!("pipeline unbound from sdk callbacks");
            true
        }
        _ => false,
    }
}

/// Pipeline currently receiving callbacks
///
/// The slot lock is released before returning so callback work never
/// serializes against `bind` / `unbind`.
#[inline]
pub(crate) fn bound() -> Option<Arc<Pipeline>> {
    BOUND
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Whether any scanner currently owns the SDK callbacks
pub fn is_bound() -> bool {
    BOUND
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Serializes tests that bind the process-wide slot
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}
