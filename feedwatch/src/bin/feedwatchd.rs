//! Alarm daemon: polls the configured feed until interrupted.

use std::env;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use feedwatch::Config;
use feedwatch::notify::LogNotifier;
use feedwatch::scheduler::Scheduler;
use feedwatch::tracing::{self, prelude::*};

const DEFAULT_CONFIG: &str = "config.json";

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init_journald_or_stdout();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("FEEDWATCH_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let config = Config::load(&path).with_context(|| format!("loading {path}"))?;
    info!(
        config = %path,
        channel = config.feed.channel,
        sensors = config.sensors.len(),
        "Starting feedwatchd"
    );

    let scheduler = Scheduler::from_config(config, Box::new(LogNotifier))?;

    let cancellation = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancellation.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    cancellation.cancel();
    task.await?;

    info!("Exiting.");
    Ok(())
}
