//! Consumer-side metrics
//!
//! The ingestion crate counts what the SDK delivers. This module counts what
//! consumers actually pull off the streams and keeps an in-memory summary
//! for end-of-run reports.

use std::collections::BTreeMap;

use contracts::{DeviceEvent, DeviceHandle, PointCloudBatch};
use metrics::{counter, gauge, histogram};

/// Record one batch taken off the point stream
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_consumed;
///
/// while let Ok(batch) = points.recv().await {
///     record_batch_consumed(&batch);
/// }
/// ```
pub fn record_batch_consumed(batch: &PointCloudBatch) {
    let handle = batch.handle.to_string();
    counter!("livox_consumer_batches_total", "handle" => handle.clone()).increment(1);
    counter!("livox_consumer_points_total", "handle" => handle).increment(batch.len() as u64);
    histogram!("livox_consumer_batch_points").record(batch.len() as f64);
}

/// Record one event taken off the device stream
pub fn record_device_event(event: &DeviceEvent) {
    let kind = if event.connected {
        "connected"
    } else {
        "disconnected"
    };
    counter!("livox_consumer_device_events_total", "kind" => kind).increment(1);
}

/// Current size of the device registry
pub fn record_connected_devices(count: usize) {
    gauge!("livox_connected_devices").set(count as f64);
}

/// In-memory aggregate of everything a consumer received
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    /// Batches received
    pub batches: u64,

    /// Points received across all batches
    pub points: u64,

    /// Connect events received
    pub connects: u64,

    /// Disconnect events received
    pub disconnects: u64,

    /// Points per batch
    pub batch_size: RunningStats,

    /// Batches per device
    pub per_device: BTreeMap<DeviceHandle, u64>,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_batch(&mut self, batch: &PointCloudBatch) {
        self.batches += 1;
        self.points += batch.len() as u64;
        self.batch_size.push(batch.len() as f64);
        *self.per_device.entry(batch.handle).or_insert(0) += 1;
    }

    pub fn record_event(&mut self, event: &DeviceEvent) {
        if event.connected {
            self.connects += 1;
        } else {
            self.disconnects += 1;
        }
    }

    /// Fold counts gathered by another consumer into this one
    pub fn merge(&mut self, other: &StreamStats) {
        self.batches += other.batches;
        self.points += other.points;
        self.connects += other.connects;
        self.disconnects += other.disconnects;
        self.batch_size.merge(&other.batch_size);
        for (handle, count) in &other.per_device {
            *self.per_device.entry(*handle).or_insert(0) += count;
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            batches: self.batches,
            points: self.points,
            connects: self.connects,
            disconnects: self.disconnects,
            batch_size: StatsSummary::from(&self.batch_size),
            per_device: self.per_device.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Stream summary
#[derive(Debug, Clone, Default)]
pub struct StreamSummary {
    pub batches: u64,
    pub points: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub batch_size: StatsSummary,
    pub per_device: BTreeMap<DeviceHandle, u64>,
}

impl std::fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Stream Summary ===")?;
        writeln!(f, "Batches: {}", self.batches)?;
        writeln!(f, "Points: {}", self.points)?;
        writeln!(
            f,
            "Device events: {} connected, {} disconnected",
            self.connects, self.disconnects
        )?;
        writeln!(f, "Points per batch: {}", self.batch_size)?;

        if !self.per_device.is_empty() {
            writeln!(f, "Batches per device:")?;
            for (handle, count) in &self.per_device {
                writeln!(f, "  {}: {}", handle, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean / variance (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Combine with stats collected over a disjoint sample (Chan et al.)
    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let weight = self.count as f64 * other.count as f64 / count as f64;

        self.mean += delta * other.count as f64 / count as f64;
        self.m2 += other.m2 + delta * delta * weight;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count = count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
