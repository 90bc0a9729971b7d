//! Configuration file loading and validation.
//!
//! Everything that can be wrong with the configuration is rejected here,
//! before the first cycle runs. In particular an unknown trigger operator
//! is a load error, never an evaluation-time surprise.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sensor::SensorSpec;

pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";

/// Upper bound for every configured interval, roughly ten years.
pub const MAX_INTERVAL_SECONDS: i64 = 10 * 366 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Sensor #{0} has an empty id")]
    EmptySensorId(usize),

    #[error("Sensor id '{0}' is configured more than once")]
    DuplicateSensorId(String),

    #[error("Sensor '{0}' has a non-finite trigger value")]
    NonFiniteTrigger(String),

    #[error("Feed base URL '{0}' must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: i64,
    },
}

/// Where and how often to fetch the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub channel: u64,
    pub read_api_key: Option<String>,
    pub poll_interval_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            channel: 0,
            read_api_key: None,
            poll_interval_seconds: 5,
            timeout_seconds: 30,
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Minimum seconds between two batches of the same class. `-1` disables
/// the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodConfig {
    pub alarm_min_interval_seconds: i64,
    pub no_data_min_interval_seconds: i64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            alarm_min_interval_seconds: 60,
            no_data_min_interval_seconds: -1,
        }
    }
}

/// Timing knobs of the evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Seconds without feed movement before the stale-feed alert fires.
    /// `-1` disables the monitor.
    pub no_data_threshold_seconds: i64,
    pub flood: FloodConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            no_data_threshold_seconds: 600,
            flood: FloodConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,

    pub sensors: Vec<SensorSpec>,

    #[serde(flatten)]
    pub engine: EngineSettings,

    /// JSON file holding the global snooze flag, written by whoever
    /// manages notification muting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snooze_file: Option<PathBuf>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sensors(&self.sensors)?;
        validate_disable_or_positive(
            "no_data_threshold_seconds",
            self.engine.no_data_threshold_seconds,
        )?;
        validate_disable_or_positive(
            "flood.alarm_min_interval_seconds",
            self.engine.flood.alarm_min_interval_seconds,
        )?;
        validate_disable_or_positive(
            "flood.no_data_min_interval_seconds",
            self.engine.flood.no_data_min_interval_seconds,
        )?;

        if !(self.feed.base_url.starts_with("http://") || self.feed.base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidBaseUrl(self.feed.base_url.clone()));
        }
        validate_period("feed.poll_interval_seconds", self.feed.poll_interval_seconds)?;
        validate_period("feed.timeout_seconds", self.feed.timeout_seconds)?;

        Ok(())
    }
}

/// Validate sensor specs the same way for a config file and for specs
/// supplied programmatically.
pub fn validate_sensors(sensors: &[SensorSpec]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (index, sensor) in sensors.iter().enumerate() {
        if sensor.id.trim().is_empty() {
            return Err(ConfigError::EmptySensorId(index));
        }
        if !seen.insert(sensor.id.as_str()) {
            return Err(ConfigError::DuplicateSensorId(sensor.id.clone()));
        }
        if !sensor.trigger_value.is_finite() {
            return Err(ConfigError::NonFiniteTrigger(sensor.id.clone()));
        }
    }
    Ok(())
}

fn validate_disable_or_positive(field: &'static str, value: i64) -> Result<(), ConfigError> {
    if !(-1..=MAX_INTERVAL_SECONDS).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            expected: "-1 (disabled) or 0 to 316224000 seconds",
            value,
        });
    }
    Ok(())
}

fn validate_period(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_INTERVAL_SECONDS as u64 {
        return Err(ConfigError::OutOfRange {
            field,
            expected: "1 to 316224000 seconds",
            value: i64::try_from(value).unwrap_or(i64::MAX),
        });
    }
    Ok(())
}
