//! Ingestion metrics
//!
//! Atomic counters readable through [`MetricsSnapshot`], mirrored to the
//! `metrics` facade so an installed exporter can scrape them.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

/// Callback-side counters
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Point deliveries decoded
    batches_received: AtomicU64,

    /// Points decoded across all batches
    points_received: AtomicU64,

    /// Device info callbacks processed
    events_received: AtomicU64,

    /// Callbacks ignored because the pipeline was not running
    stale_callbacks: AtomicU64,

    /// Point deliveries with a layout this build cannot decode
    unsupported_batches: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decoded batch
    pub fn record_batch(&self, points: usize) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.points_received
            .fetch_add(points as u64, Ordering::Relaxed);
        counter!("livox_batches_received_total").increment(1);
        counter!("livox_points_received_total").increment(points as u64);
    }

    /// Record a device event
    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        counter!("livox_device_events_total").increment(1);
    }

    /// Record a callback rejected by the liveness check
    pub fn record_stale(&self) {
        self.stale_callbacks.fetch_add(1, Ordering::Relaxed);
        counter!("livox_stale_callbacks_total").increment(1);
    }

    /// Record an undecodable delivery
    pub fn record_unsupported(&self, data_type: u8) {
        self.unsupported_batches.fetch_add(1, Ordering::Relaxed);
        counter!("livox_unsupported_batches_total", "data_type" => data_type.to_string())
            .increment(1);
    }

    pub fn batches_received(&self) -> u64 {
        self.batches_received.load(Ordering::Relaxed)
    }

    pub fn points_received(&self) -> u64 {
        self.points_received.load(Ordering::Relaxed)
    }

    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    pub fn stale_callbacks(&self) -> u64 {
        self.stale_callbacks.load(Ordering::Relaxed)
    }

    pub fn unsupported_batches(&self) -> u64 {
        self.unsupported_batches.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Point deliveries decoded
    pub batches_received: u64,

    /// Batches discarded because the point channel was full
    pub batches_dropped: u64,

    /// Points decoded across all batches
    pub points_received: u64,

    /// Device info callbacks processed
    pub events_received: u64,

    /// Events discarded because the event channel was full
    pub events_dropped: u64,

    /// Callbacks ignored because the pipeline was not running
    pub stale_callbacks: u64,

    /// Undecodable point deliveries
    pub unsupported_batches: u64,

    /// Batches currently queued
    pub point_queue_len: usize,

    /// Events currently queued
    pub event_queue_len: usize,
}
