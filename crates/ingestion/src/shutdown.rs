//! Shutdown coordination between `stop()` and SDK callbacks
//!
//! Callbacks enter through [`ShutdownCoordinator::enter`] and hold the
//! returned [`InFlight`] guard while they touch shared state. Once
//! [`ShutdownCoordinator::shutdown`] returns, no guard is outstanding and
//! none can be acquired again.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use tracing::debug;

/// Liveness flag plus in-flight callback accounting
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    live: AtomicBool,
    in_flight: AtomicUsize,
    lock: Mutex<()>,
    idle: Condvar,
}

/// Proof that a callback entered while the pipeline was live
#[must_use = "dropping the guard ends the in-flight section"]
#[derive(Debug)]
pub struct InFlight<'a> {
    coordinator: &'a ShutdownCoordinator,
}

impl ShutdownCoordinator {
    /// Create a coordinator in the not-live state
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting callbacks
    pub fn activate(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    /// Whether callbacks are currently accepted
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of callbacks currently inside a guarded section
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Enter a guarded section, or `None` if the pipeline is not live
    #[inline]
    pub fn enter(&self) -> Option<InFlight<'_>> {
        if !self.is_live() {
            return None;
        }
        // Count first, then re-check: shutdown() clears the flag before it
        // reads the count, so one of the two sides always sees the other.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if !self.is_live() {
            self.exit();
            return None;
        }
        Some(InFlight { coordinator: self })
    }

    fn exit(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 && !self.is_live() {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.idle.notify_all();
        }
    }

    /// Stop accepting callbacks and wait for in-flight ones to finish
    pub fn shutdown(&self) {
        self.begin_shutdown();
        self.wait_idle();
    }

    /// Clear the liveness flag
    pub fn begin_shutdown(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    /// Block until every guard acquired before `begin_shutdown` is dropped
    pub fn wait_idle(&self) {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = self
            .idle
            .wait_while(guard, |_| self.in_flight.load(Ordering::SeqCst) > 0)
            .unwrap_or_else(PoisonError::into_inner);
        debug!("all in-flight callbacks drained");
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.coordinator.exit();
    }
}
