//! Scan session orchestrator - drives one scanner from start to stop.
//!
//! Points are consumed on the calling task, device events on a spawned
//! task. Both consumers run until the scanner is stopped and its streams
//! report end-of-stream.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AppConfig, DeviceEvent, PointCloudBatch};
use ingestion::{Receiver, Scanner};
use observability::StreamStats;
use tracing::{debug, info, warn};

use super::{RunStats, StopReason};
use crate::error::CliError;
use crate::sdk::build_sdk;

/// How often the consumer logs a status line
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Resolved application configuration
    pub app: AppConfig,

    /// Maximum number of batches to consume (None = unlimited)
    pub max_batches: Option<u64>,

    /// Session length (None = until shutdown)
    pub duration: Option<Duration>,
}

/// One scanner run
pub struct ScanSession {
    config: SessionConfig,
}

impl ScanSession {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or a configured limit is hit
    pub async fn run<F>(self, shutdown: F) -> Result<RunStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let app = &self.config.app;

        let sdk = build_sdk(&app.simulation);
        let mut scanner = Scanner::new(sdk, app.scanner.clone()).map_err(CliError::from)?;
        let points = scanner.point_cloud_stream();
        let events = scanner.device_event_stream();

        scanner
            .start()
            .map_err(CliError::from)
            .context("Failed to start scanner")?;

        info!(
            max_batches = ?self.config.max_batches,
            duration = ?self.config.duration,
            "Scanner running"
        );

        let event_task = tokio::spawn(consume_events(events));

        let mut stats = StreamStats::new();
        let stop_reason = self
            .consume_points(&scanner, &points, &mut stats, shutdown)
            .await;

        info!(reason = %stop_reason, "Stopping scanner...");
        let scanner = stop_scanner(scanner).await?;

        // Batches queued before stop are still delivered
        if stop_reason != StopReason::BatchLimit {
            while let Ok(batch) = points.try_recv() {
                observability::record_batch_consumed(&batch);
                stats.record_batch(&batch);
            }
        }

        match event_task.await {
            Ok(event_stats) => stats.merge(&event_stats),
            Err(e) => warn!(error = %e, "Device event consumer failed"),
        }

        let run_stats = RunStats {
            stop_reason,
            duration: start_time.elapsed(),
            stream: stats.summary(),
            ingestion: scanner.metrics(),
            devices: scanner.current_devices(),
        };

        info!(
            duration_secs = run_stats.duration.as_secs_f64(),
            batches_per_sec = format!("{:.2}", run_stats.batches_per_sec()),
            "Scan session complete"
        );

        Ok(run_stats)
    }

    async fn consume_points<F>(
        &self,
        scanner: &Scanner,
        points: &Receiver<PointCloudBatch>,
        stats: &mut StreamStats,
        shutdown: F,
    ) -> StopReason
    where
        F: Future<Output = ()>,
    {
        let limit = self.config.duration;
        let deadline = async move {
            match limit {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown, deadline);

        let mut ticker = tokio::time::interval(STATUS_INTERVAL);
        ticker.tick().await;

        loop {
            tokio::select! {
                batch = points.recv() => {
                    let Ok(batch) = batch else {
                        return StopReason::StreamClosed;
                    };

                    observability::record_batch_consumed(&batch);
                    stats.record_batch(&batch);
                    debug!(
                        handle = batch.handle,
                        points = batch.len(),
                        first = ?batch.points.first(),
                        "Batch received"
                    );

                    if self.config.max_batches.is_some_and(|max| stats.batches >= max) {
                        info!(batches = stats.batches, "Reached max batches limit");
                        return StopReason::BatchLimit;
                    }
                }
                _ = ticker.tick() => report_status(scanner, stats),
                _ = &mut shutdown => {
                    warn!("Received shutdown signal");
                    return StopReason::Signal;
                }
                _ = &mut deadline => return StopReason::Duration,
            }
        }
    }
}

/// Stop the scanner off the async runtime
///
/// `stop()` blocks until in-flight callbacks return and the SDK has joined
/// its threads.
pub async fn stop_scanner(mut scanner: Scanner) -> Result<Scanner, CliError> {
    tokio::task::spawn_blocking(move || -> Result<Scanner, CliError> {
        scanner.stop()?;
        Ok(scanner)
    })
    .await
    .map_err(|e| CliError::task(e.to_string()))?
}

async fn consume_events(events: Receiver<DeviceEvent>) -> StreamStats {
    let mut stats = StreamStats::new();

    while let Ok(event) = events.recv().await {
        observability::record_device_event(&event);
        stats.record_event(&event);

        if event.connected {
            info!(device = %event.device, "Device connected");
        } else {
            info!(device = %event.device, "Device disconnected");
        }
    }

    debug!("Device event stream closed");
    stats
}

fn report_status(scanner: &Scanner, stats: &StreamStats) {
    let metrics = scanner.metrics();
    let devices = scanner.current_devices().len();
    observability::record_connected_devices(devices);

    info!(
        devices,
        consumed = stats.batches,
        decoded = metrics.batches_received,
        dropped = metrics.batches_dropped,
        queued = metrics.point_queue_len,
        "Scanner status"
    );
}
