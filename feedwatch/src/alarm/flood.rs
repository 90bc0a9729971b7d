//! Minimum re-notification intervals per alarm class.

use std::collections::HashMap;

use strum::IntoEnumIterator;
use time::{Duration, OffsetDateTime};

use super::tier::Tier;
use crate::tracing::prelude::*;

/// Class of message sharing one flood-control timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloodClass {
    Alarm(Tier),
    NoData,
}

/// Timer for one [`FloodClass`].
#[derive(Debug, Clone, Default)]
pub struct FloodControlState {
    last_sent_at: Option<OffsetDateTime>,
    /// `None` disables the guard.
    min_interval: Option<Duration>,
}

impl FloodControlState {
    /// Negative intervals disable the guard.
    pub fn new(min_interval_seconds: i64) -> Self {
        Self {
            last_sent_at: None,
            min_interval: (min_interval_seconds >= 0).then(|| Duration::seconds(min_interval_seconds)),
        }
    }

    pub fn last_sent_at(&self) -> Option<OffsetDateTime> {
        self.last_sent_at
    }

    fn window_open(&self, now: OffsetDateTime) -> bool {
        match (self.last_sent_at, self.min_interval) {
            // Past the representable range the window never reopens.
            (Some(last), Some(interval)) => last
                .checked_add(interval)
                .is_some_and(|reopens_at| now >= reopens_at),
            _ => true,
        }
    }
}

/// Drops batches sent too soon after the previous batch of the same class.
#[derive(Debug, Clone)]
pub struct FloodControlGate {
    classes: HashMap<FloodClass, FloodControlState>,
}

impl FloodControlGate {
    pub fn new(alarm_min_interval_seconds: i64, no_data_min_interval_seconds: i64) -> Self {
        let mut classes: HashMap<_, _> = Tier::iter()
            .map(|tier| {
                (
                    FloodClass::Alarm(tier),
                    FloodControlState::new(alarm_min_interval_seconds),
                )
            })
            .collect();
        classes.insert(
            FloodClass::NoData,
            FloodControlState::new(no_data_min_interval_seconds),
        );
        Self { classes }
    }

    pub fn state(&self, class: FloodClass) -> Option<&FloodControlState> {
        self.classes.get(&class)
    }

    /// Decide whether a batch of `batch_len` messages may go out now.
    ///
    /// Empty batches never pass and never touch the timer. A batch inside the
    /// window is dropped without moving the timer either.
    pub fn admit(&mut self, class: FloodClass, batch_len: usize, now: OffsetDateTime) -> bool {
        if batch_len == 0 {
            return false;
        }

        let state = self.classes.entry(class).or_default();
        if !state.window_open(now) {
            info!(
                class = ?class,
                dropped = batch_len,
                "Not sending alarms because of flood protection"
            );
            return false;
        }

        state.last_sent_at = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const T0: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);
    const USER: FloodClass = FloodClass::Alarm(Tier::User);

    #[test]
    fn should_pass_first_batch() {
        let mut gate = FloodControlGate::new(60, -1);
        assert!(gate.admit(USER, 1, T0));
        assert_eq!(gate.state(USER).unwrap().last_sent_at(), Some(T0));
    }

    #[test]
    fn should_drop_batch_inside_window_without_moving_timer() {
        let mut gate = FloodControlGate::new(60, -1);
        assert!(gate.admit(USER, 1, T0));

        assert!(!gate.admit(USER, 1, T0 + Duration::seconds(10)));
        assert_eq!(gate.state(USER).unwrap().last_sent_at(), Some(T0));

        assert!(gate.admit(USER, 1, T0 + Duration::seconds(60)));
    }

    #[test]
    fn should_ignore_empty_batches() {
        let mut gate = FloodControlGate::new(60, -1);
        assert!(!gate.admit(USER, 0, T0));
        assert_eq!(gate.state(USER).unwrap().last_sent_at(), None);

        assert!(gate.admit(USER, 2, T0 + Duration::seconds(1)));
    }

    #[test]
    fn should_keep_independent_timers_per_class() {
        let mut gate = FloodControlGate::new(60, 3600);
        assert!(gate.admit(USER, 1, T0));
        assert!(gate.admit(FloodClass::Alarm(Tier::Admin), 1, T0));
        assert!(gate.admit(FloodClass::NoData, 1, T0));

        let later = T0 + Duration::seconds(120);
        assert!(gate.admit(USER, 1, later));
        assert!(!gate.admit(FloodClass::NoData, 1, later));
    }

    #[test]
    fn should_keep_window_closed_when_interval_exceeds_calendar() {
        let mut gate = FloodControlGate::new(i64::MAX, -1);
        assert!(gate.admit(USER, 1, T0));

        assert!(!gate.admit(USER, 1, T0 + Duration::days(365 * 1000)));
        assert_eq!(gate.state(USER).unwrap().last_sent_at(), Some(T0));
    }

    #[test]
    fn should_disable_guard_with_negative_interval() {
        let mut gate = FloodControlGate::new(60, -1);
        assert!(gate.admit(FloodClass::NoData, 1, T0));
        assert!(gate.admit(FloodClass::NoData, 1, T0));
    }
}
