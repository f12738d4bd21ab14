//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::AppConfig;
use std::time::Duration;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::pipeline::{ScanSession, SessionConfig};

/// Execute the `run` command
pub async fn run_scan(args: &RunArgs, config: AppConfig) -> Result<()> {
    info!(
        point_capacity = config.scanner.point_channel_capacity,
        event_capacity = config.scanner.event_channel_capacity,
        metrics_port = ?config.metrics.port,
        "Configuration loaded"
    );

    let session = ScanSession::new(SessionConfig {
        app: config,
        max_batches: (args.max_batches > 0).then_some(args.max_batches),
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
    });

    info!("Starting scanner...");
    let stats = session
        .run(shutdown_signal())
        .await
        .context("Scan session failed")?;

    info!(
        batches = stats.stream.batches,
        points = stats.stream.points,
        dropped = stats.ingestion.batches_dropped,
        "Livox Scan finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that fails to install never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
