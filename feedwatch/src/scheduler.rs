//! The periodic loop driving the engine.
//!
//! Each tick fetches one snapshot, reads the snooze flag, runs one
//! evaluation cycle and hands anything worth sending to the notifier. A
//! failed or timed-out fetch skips the cycle entirely, so the engine's
//! cursor stays where it was and the next tick simply tries again.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::alarm::{NoSnooze, SnoozeFile, SnoozeSource};
use crate::config::{Config, FeedConfig};
use crate::engine::{AlarmEvaluationEngine, EvaluationResult};
use crate::error::Result;
use crate::feed::{FeedError, FeedSource, HttpFeed};
use crate::notify::Notifier;
use crate::tracing::prelude::*;

pub struct Scheduler {
    engine: AlarmEvaluationEngine,
    feed: Box<dyn FeedSource>,
    snooze: Box<dyn SnoozeSource>,
    notifier: Box<dyn Notifier>,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl Scheduler {
    pub fn new(
        engine: AlarmEvaluationEngine,
        feed: Box<dyn FeedSource>,
        snooze: Box<dyn SnoozeSource>,
        notifier: Box<dyn Notifier>,
        feed_config: &FeedConfig,
    ) -> Self {
        Self {
            engine,
            feed,
            snooze,
            notifier,
            poll_interval: feed_config.poll_interval(),
            fetch_timeout: feed_config.timeout(),
        }
    }

    /// Wire up the HTTP feed and snooze file named in `config`.
    pub fn from_config(config: Config, notifier: Box<dyn Notifier>) -> Result<Self> {
        let engine = AlarmEvaluationEngine::new(config.sensors, config.engine)?;
        let feed = HttpFeed::new(&config.feed)?;
        debug!(url = feed.url(), "Feed source configured");

        let snooze: Box<dyn SnoozeSource> = match config.snooze_file {
            Some(path) => Box::new(SnoozeFile::new(path)),
            None => Box::new(NoSnooze),
        };

        Ok(Self::new(engine, Box::new(feed), snooze, notifier, &config.feed))
    }

    pub fn engine(&self) -> &AlarmEvaluationEngine {
        &self.engine
    }

    pub async fn run(mut self, cancellation: CancellationToken) {
        trace!("Scheduler task started.");

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    info!("Scheduler shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        trace!("Scheduler task stopped.");
    }

    /// Run one cycle. Returns the result if a snapshot was evaluated.
    pub async fn tick(&mut self) -> Option<EvaluationResult> {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.feed.fetch())
            .await
            .unwrap_or(Err(FeedError::Timeout(self.fetch_timeout)));

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to fetch feed, retrying next tick");
                return None;
            }
        };

        let snooze = self.snooze.read().await;
        let result = self.engine.evaluate(&snapshot, &snooze);

        if !result.is_empty() {
            self.notifier.deliver(&result).await;
        }

        Some(result)
    }
}
