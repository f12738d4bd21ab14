//! `devices` command implementation.

use anyhow::{Context, Result};
use contracts::{AppConfig, DeviceIdentity};
use ingestion::Scanner;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::cli::DevicesArgs;
use crate::error::CliError;
use crate::pipeline::stop_scanner;
use crate::sdk::build_sdk;

#[derive(Serialize)]
struct DeviceList<'a> {
    count: usize,
    devices: &'a [DeviceIdentity],
}

/// Execute the `devices` command
pub async fn run_devices(args: &DevicesArgs, config: AppConfig) -> Result<()> {
    let sdk = build_sdk(&config.simulation);
    let mut scanner = Scanner::new(sdk, config.scanner).map_err(CliError::from)?;
    scanner
        .start()
        .map_err(CliError::from)
        .context("Failed to start scanner")?;

    info!(wait_secs = args.wait, "Discovering devices...");
    tokio::time::sleep(Duration::from_secs(args.wait)).await;

    let devices = scanner.current_devices();
    stop_scanner(scanner)
        .await
        .context("Failed to stop scanner")?;

    if args.json {
        let list = DeviceList {
            count: devices.len(),
            devices: &devices,
        };
        let json = serde_json::to_string_pretty(&list).context("Failed to serialize devices")?;
        println!("{}", json);
    } else {
        print_devices(&devices);
    }

    Ok(())
}

fn print_devices(devices: &[DeviceIdentity]) {
    if devices.is_empty() {
        println!("No devices discovered");
        return;
    }

    println!("\nDiscovered devices ({}):", devices.len());
    for device in devices {
        println!("  [{:>2}] {}", device.handle, device.broadcast_code);
    }
    println!();
}
