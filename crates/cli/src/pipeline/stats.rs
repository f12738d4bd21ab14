//! Scan session statistics.

use std::fmt;
use std::time::Duration;

use contracts::DeviceIdentity;
use ingestion::MetricsSnapshot;
use observability::StreamSummary;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl-C or SIGTERM
    Signal,
    /// `--duration` elapsed
    Duration,
    /// `--max-batches` reached
    BatchLimit,
    /// Point stream ended on its own
    StreamClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Signal => "signal",
            Self::Duration => "duration elapsed",
            Self::BatchLimit => "batch limit reached",
            Self::StreamClosed => "stream closed",
        };
        f.write_str(reason)
    }
}

/// Statistics from a scan session
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Why the session ended
    pub stop_reason: StopReason,

    /// Wall time from start to stop
    pub duration: Duration,

    /// What the consumers received
    pub stream: StreamSummary,

    /// Scanner counters at stop
    pub ingestion: MetricsSnapshot,

    /// Registry contents at stop
    pub devices: Vec<DeviceIdentity>,
}

impl RunStats {
    /// Consumed batches per second
    pub fn batches_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.stream.batches as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of decoded batches lost to backpressure, as percentage
    pub fn drop_rate(&self) -> f64 {
        let total = self.ingestion.batches_received;
        if total > 0 {
            (self.ingestion.batches_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Scan Session ===\n");

        println!("Overview");
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Batches consumed: {}", self.stream.batches);
        println!("   ├─ Points consumed: {}", self.stream.points);
        println!("   └─ Batches/s: {:.2}", self.batches_per_sec());

        println!("\nIngestion");
        println!("   ├─ Batches decoded: {}", self.ingestion.batches_received);
        println!(
            "   ├─ Batches dropped: {} ({:.2}%)",
            self.ingestion.batches_dropped,
            self.drop_rate()
        );
        println!("   ├─ Device events: {}", self.ingestion.events_received);
        println!("   ├─ Events dropped: {}", self.ingestion.events_dropped);
        println!(
            "   ├─ Unsupported batches: {}",
            self.ingestion.unsupported_batches
        );
        println!("   └─ Stale callbacks: {}", self.ingestion.stale_callbacks);

        println!("\nPoints per batch: {}", self.stream.batch_size);

        if !self.devices.is_empty() {
            println!("\nConnected devices");
            for device in &self.devices {
                let batches = self
                    .stream
                    .per_device
                    .get(&device.handle)
                    .copied()
                    .unwrap_or(0);
                println!("   ├─ {}: {} batches", device, batches);
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(received: u64, dropped: u64, consumed: u64, secs: u64) -> RunStats {
        RunStats {
            stop_reason: StopReason::Duration,
            duration: Duration::from_secs(secs),
            stream: StreamSummary {
                batches: consumed,
                ..Default::default()
            },
            ingestion: MetricsSnapshot {
                batches_received: received,
                batches_dropped: dropped,
                ..Default::default()
            },
            devices: Vec::new(),
        }
    }

    #[test]
    fn test_rates() {
        let stats = stats(200, 50, 150, 10);
        assert!((stats.batches_per_sec() - 15.0).abs() < 1e-10);
        assert!((stats.drop_rate() - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_rates_without_data() {
        let stats = stats(0, 0, 0, 0);
        assert_eq!(stats.batches_per_sec(), 0.0);
        assert_eq!(stats.drop_rate(), 0.0);
    }
}
