// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! appver demo - replays an upload / update check / rollout session
//!
//! Usage:
//!   appver                          # default scenario, 50% rollout
//!   appver --percentage 25          # smaller percentage cohort
//!   appver --config appver.json     # load manager config

use anyhow::Context;
use appver::{LoggingInstaller, VersionManager, load_config};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "appver")]
#[command(author, version, about = "Application version manager demo")]
struct Cli {
    /// Manager config file (JSON); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Application name to upload versions for
    #[arg(long, default_value = "PhonePe")]
    app: String,

    /// Share of devices for the percentage rollout
    #[arg(long, default_value_t = 50)]
    percentage: u32,

    /// OS version of the device checking for updates
    #[arg(long, default_value = "Android-10")]
    device_os: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appver=debug".parse().context("invalid log directive")?),
        )
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => appver::ManagerConfig::default(),
    };
    info!(
        "Loaded config: candidate_threshold={}, version_ordering={:?}",
        config.candidate_threshold, config.version_ordering
    );

    let manager = VersionManager::with_config(&config);
    let app = cli.app.as_str();
    let device_ids: Vec<String> = (1..=8).map(|i| format!("device{i}")).collect();

    manager.upload_new_version(app, "v1.0", "Android-9", "v1.0 content", false)?;
    manager.upload_new_version(app, "v2.0", "Android-10", "v2.0 content", false)?;

    let current_version = "v1.0";
    match manager.check_for_updates(app, current_version, &cli.device_os) {
        Some(version) => println!("An update is available! New version: {version}"),
        None => println!("No update available."),
    }

    let mut installer = LoggingInstaller;
    if let Some(version) = manager.apply_update(app, current_version, &cli.device_os, &mut installer)? {
        println!("Device on {current_version} updated to {version}");
    }

    let report = manager.release_version(app, "v2.0", "percentage", cli.percentage, &device_ids)?;
    println!(
        "Percentage rollout completed: {} of {} targeted devices",
        report.released.len(),
        report.target
    );

    let beta_devices = ["device1", "device2"];
    manager.release_version(app, "v2.0", "beta", 0, &beta_devices)?;
    println!("Beta rollout completed");

    let mut assignments: Vec<_> = manager.assignments().into_iter().collect();
    assignments.sort();
    for (device, version) in assignments {
        println!("  {device} -> {version}");
    }

    println!("Total execution time: {:?}", start.elapsed());
    Ok(())
}
