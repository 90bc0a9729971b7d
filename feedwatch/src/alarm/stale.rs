//! One-shot "no new data" detection for a feed that stopped advancing.
//!
//! # State Machine
//!
//! ```text
//!          elapsed >= threshold           alert delivered
//!  Fresh ─────────────────────► Stale ──────────────────► Notified
//!   ▲                                                        │
//!   └──────────────── reset() (cursor advanced) ─────────────┘
//! ```
//!
//! - **Fresh:** the feed moved within the threshold. Nothing to do.
//! - **Stale:** the feed has not moved for at least the threshold and no
//!   alert has gone out for this stall yet.
//! - **Notified:** the alert went out. Stays here, silent, until the
//!   cursor advances again.
//!
//! The latch is only set once the caller confirms delivery with
//! [`StaleFeedMonitor::latch`], so a stall alert held back by flood
//! control is retried on the next cycle.

use time::Duration;

/// Result of [`StaleFeedMonitor::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleStatus {
    /// Monitor disabled, or the feed moved recently enough.
    Fresh,

    /// Threshold exceeded and not yet reported.
    Stale,

    /// Threshold exceeded and already reported for this stall.
    Notified,
}

/// Remembers that the current stall has been reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaleFeedLatch {
    pub has_fired: bool,
}

#[derive(Debug, Clone)]
pub struct StaleFeedMonitor {
    /// `None` disables the monitor.
    threshold: Option<Duration>,
    latch: StaleFeedLatch,
}

impl StaleFeedMonitor {
    /// Negative thresholds disable the monitor.
    pub fn new(no_data_threshold_seconds: i64) -> Self {
        Self {
            threshold: Self::threshold_from_seconds(no_data_threshold_seconds),
            latch: StaleFeedLatch::default(),
        }
    }

    fn threshold_from_seconds(seconds: i64) -> Option<Duration> {
        (seconds >= 0).then(|| Duration::seconds(seconds))
    }

    pub fn threshold(&self) -> Option<Duration> {
        self.threshold
    }

    /// Change the threshold without touching the latch.
    pub fn set_threshold(&mut self, no_data_threshold_seconds: i64) {
        self.threshold = Self::threshold_from_seconds(no_data_threshold_seconds);
    }

    pub fn latch_state(&self) -> StaleFeedLatch {
        self.latch
    }

    /// Classify a stall that has lasted `elapsed` since the cursor last moved.
    pub fn check(&self, elapsed: Duration) -> StaleStatus {
        let Some(threshold) = self.threshold else {
            return StaleStatus::Fresh;
        };

        if elapsed < threshold {
            StaleStatus::Fresh
        } else if self.latch.has_fired {
            StaleStatus::Notified
        } else {
            StaleStatus::Stale
        }
    }

    /// Record that the stale alert for the current stall went out.
    pub fn latch(&mut self) {
        self.latch.has_fired = true;
    }

    /// Re-arm after the cursor advanced.
    pub fn reset(&mut self) {
        self.latch.has_fired = false;
    }
}
