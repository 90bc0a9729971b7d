//! Replays a recording of feed snapshots through the alarm engine.
//!
//! Each line of the recording is evaluated as one polling cycle, with the
//! clock advancing by `--tick-seconds` between cycles. Useful for tuning
//! trigger values, flood intervals and the no-data threshold against real
//! captured data before deploying a configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use feedwatch::alarm::SnoozeState;
use feedwatch::{AlarmEvaluationEngine, Config};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::info;

mod output;
mod replay;

use output::Summary;
use replay::Replay;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (same format as the daemon's)
    config: PathBuf,

    /// JSON-lines recording, one feed snapshot per line
    recording: PathBuf,

    /// Simulated seconds between cycles
    #[arg(short, long, default_value_t = 5)]
    tick_seconds: i64,

    /// Simulated time of the first cycle (RFC 3339). Defaults to the newest
    /// entry of the first snapshot.
    #[arg(long)]
    start: Option<String>,

    /// Treat notifications as snoozed until this time (RFC 3339)
    #[arg(long)]
    snoozed_until: Option<String>,

    /// Override the configured no-data threshold in seconds
    #[arg(long)]
    no_data_threshold: Option<i64>,

    /// Show cycles that produced nothing
    #[arg(short, long)]
    verbose: bool,
}

fn parse_time(text: &str, what: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339).with_context(|| format!("invalid {what} '{text}'"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let text = std::fs::read_to_string(&args.recording)
        .with_context(|| format!("reading {}", args.recording.display()))?;
    let snapshots = replay::parse_recording(&text)?;
    info!(snapshots = snapshots.len(), "Loaded recording");

    let Some(first) = snapshots.first() else {
        println!("Recording is empty");
        return Ok(());
    };

    let start = match &args.start {
        Some(text) => parse_time(text, "start time")?,
        None => first
            .newest_timestamp()
            .unwrap_or_else(OffsetDateTime::now_utc),
    };

    let snooze = match &args.snoozed_until {
        Some(text) => SnoozeState::until(parse_time(text, "snooze time")?, "replay"),
        None => SnoozeState::default(),
    };

    let mut engine = AlarmEvaluationEngine::new(config.sensors, config.engine)?;
    if let Some(seconds) = args.no_data_threshold {
        engine.set_no_data_threshold(seconds);
    }

    let mut replay = Replay::new(engine, start, Duration::seconds(args.tick_seconds), snooze);
    let mut summary = Summary::default();

    for snapshot in &snapshots {
        let step = replay.step(snapshot);
        output::print_step(&step, args.verbose);
        summary.record(&step);
    }

    info!(
        last_entry_id = ?replay.engine().cursor().last_entry_id(),
        "Replay finished"
    );
    summary.print();
    Ok(())
}
