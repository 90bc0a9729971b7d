//! Command-line interface for feedwatch.
//!
//! Validates configuration files and inspects the live feed without
//! starting the daemon.

use std::env;

use anyhow::Result;
use time::OffsetDateTime;

use feedwatch::Config;
use feedwatch::alarm::format_timestamp;
use feedwatch::feed::{FeedSource, HttpFeed};
use feedwatch::sensor::{Reading, SensorRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: feedwatch-cli <command> <config.json>");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  check    Validate the configuration and list sensors");
        eprintln!("  once     Fetch the feed once and print sensor states");
        std::process::exit(1);
    }

    let command = &args[1];
    let config = Config::load(&args[2])?;

    match command.as_str() {
        "check" => cmd_check(&config),
        "once" => cmd_once(config).await?,
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run without arguments to see usage.");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Print the validated configuration.
fn cmd_check(config: &Config) {
    println!("Channel:   {}", config.feed.channel);
    println!("Poll:      {} s", config.feed.poll_interval_seconds);
    println!("No data:   {} s", config.engine.no_data_threshold_seconds);

    if config.sensors.is_empty() {
        println!("Sensors:   (none)");
    } else {
        println!("Sensors:");
        for sensor in &config.sensors {
            println!(
                "  - {} ({}) {} {} -> {}",
                sensor.id,
                sensor.name,
                sensor.trigger_operator,
                sensor.trigger_value,
                sensor.tier()
            );
        }
    }
}

/// Fetch the feed once and show each sensor against the newest entry.
async fn cmd_once(config: Config) -> Result<()> {
    let feed = HttpFeed::new(&config.feed)?;
    let snapshot = feed.fetch().await?;

    match snapshot.channel.last_entry_id {
        Some(id) => println!("Last entry: {id}"),
        None => println!("Last entry: (none)"),
    }

    let Some(newest) = snapshot.entries.iter().max_by_key(|entry| entry.entry_id) else {
        println!("Entries:    (none)");
        return Ok(());
    };
    let at = newest.timestamp().unwrap_or_else(OffsetDateTime::now_utc);
    println!("Newest:     {}", format_timestamp(at));

    println!("Sensors:");
    for spec in config.sensors {
        let label = snapshot.channel.field_label(&spec.id).map(str::to_string);
        let raw = newest.raw_field(&spec.id).map(|raw| raw.into_owned());
        let mut sensor = SensorRuntime::new(spec);
        let name = match (sensor.spec().name.as_str(), label) {
            ("", Some(label)) => label,
            ("", None) => sensor.spec().id.clone(),
            (name, _) => name.to_string(),
        };

        let Some(reading) = raw.as_deref().and_then(Reading::parse) else {
            println!("  - {:<20} {:>8}", name, "-");
            continue;
        };
        sensor.observe(reading, at);
        println!(
            "  - {:<20} {:>8}  {}{}",
            name,
            reading.to_string(),
            if sensor.is_triggered() { "TRIGGERED" } else { "ok" },
            sensor
                .state_text()
                .map(|text| format!(" ({text})"))
                .unwrap_or_default()
        );
    }

    Ok(())
}
