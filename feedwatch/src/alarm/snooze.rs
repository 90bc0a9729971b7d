//! Global notification mute, owned outside the engine.
//!
//! The engine only ever reads the mute flag. Whoever owns it (an admin menu,
//! a chat bot, a file written by another process) publishes a
//! [`SnoozeState`] through one of the [`SnoozeSource`] implementations.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::sync::watch;

use crate::tracing::prelude::*;

/// Snapshot of the global mute flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnoozeState {
    pub snoozed_until: Option<OffsetDateTime>,
    pub snoozed_by: Option<String>,
}

impl SnoozeState {
    pub fn until(until: OffsetDateTime, by: impl Into<String>) -> Self {
        Self {
            snoozed_until: Some(until),
            snoozed_by: Some(by.into()),
        }
    }

    /// Build from a unix timestamp in seconds; `0` (or NaN) means not
    /// snoozed. Timestamps past the calendar's end snooze indefinitely.
    pub fn from_unix(snoozed_until: f64, snoozed_by: Option<String>) -> Self {
        if snoozed_until.is_nan() || snoozed_until <= 0.0 {
            return Self::default();
        }

        let secs = snoozed_until.trunc();
        let nanos = ((snoozed_until - secs) * 1e9).round() as i64;
        let until = match OffsetDateTime::from_unix_timestamp(secs as i64) {
            Ok(until) => until.saturating_add(time::Duration::nanoseconds(nanos)),
            Err(_) => PrimitiveDateTime::MAX.assume_utc(),
        };
        Self {
            snoozed_until: Some(until),
            snoozed_by,
        }
    }

    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.snoozed_until.is_some_and(|until| now < until)
    }
}

/// Read access to the global mute flag.
///
/// Reads may be slightly stale; the engine takes whatever the source
/// reports at the start of a cycle.
#[async_trait]
pub trait SnoozeSource: Send + Sync {
    async fn read(&self) -> SnoozeState;
}

/// Never snoozed.
pub struct NoSnooze;

#[async_trait]
impl SnoozeSource for NoSnooze {
    async fn read(&self) -> SnoozeState {
        SnoozeState::default()
    }
}

#[async_trait]
impl SnoozeSource for watch::Receiver<SnoozeState> {
    async fn read(&self) -> SnoozeState {
        self.borrow().clone()
    }
}

/// On-disk form written by the account/menu layer.
#[derive(Debug, Serialize, Deserialize)]
struct SnoozeRecord {
    #[serde(default)]
    snoozed_until: f64,
    #[serde(default)]
    snoozed_by: Option<String>,
}

/// Mute flag stored as a small JSON file:
/// `{"snoozed_until": 1700000000.0, "snoozed_by": "alice"}`.
///
/// A missing or malformed file reads as not snoozed.
pub struct SnoozeFile {
    path: PathBuf,
}

impl SnoozeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnoozeSource for SnoozeFile {
    async fn read(&self) -> SnoozeState {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SnoozeState::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read snooze file");
                return SnoozeState::default();
            }
        };

        match serde_json::from_slice::<SnoozeRecord>(&bytes) {
            Ok(record) => SnoozeState::from_unix(record.snoozed_until, record.snoozed_by),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed snooze file");
                SnoozeState::default()
            }
        }
    }
}
