use time::OffsetDateTime;

use super::reading::Reading;
use super::spec::{Predicate, SensorSpec};

/// Result of feeding one reading into a [`SensorRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Condition is false after the reading.
    Untriggered,

    /// Condition is true and an alarm should be raised.
    Triggered,

    /// Condition is true but the sensor alarms only once until it clears,
    /// and it was already triggered before this reading.
    Suppressed,
}

/// Mutable evaluation state for one configured sensor.
#[derive(Debug, Clone)]
pub struct SensorRuntime {
    spec: SensorSpec,
    predicate: Predicate,
    current_value: Option<Reading>,
    was_triggered_before: bool,
    last_triggered_at: Option<OffsetDateTime>,
}

impl SensorRuntime {
    pub fn new(spec: SensorSpec) -> Self {
        let predicate = spec.trigger_operator.predicate();
        Self {
            spec,
            predicate,
            current_value: None,
            was_triggered_before: false,
            last_triggered_at: None,
        }
    }

    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    pub fn current_value(&self) -> Option<Reading> {
        self.current_value
    }

    pub fn was_triggered_before(&self) -> bool {
        self.was_triggered_before
    }

    pub fn last_triggered_at(&self) -> Option<OffsetDateTime> {
        self.last_triggered_at
    }

    /// Whether the current value meets the trigger condition. False until a
    /// value has been observed.
    pub fn is_triggered(&self) -> bool {
        self.current_value
            .is_some_and(|value| (self.predicate)(value.as_f64(), self.spec.trigger_value))
    }

    /// Apply one reading taken at `at`.
    ///
    /// Hysteresis compares against the state before this reading, so a run
    /// of triggered readings in the same batch alarms only on the first one
    /// when `alarm_only_once_until_untriggered` is set.
    pub fn observe(&mut self, value: Reading, at: OffsetDateTime) -> Observation {
        self.was_triggered_before = self.is_triggered();
        self.current_value = Some(value);

        if !self.is_triggered() {
            return Observation::Untriggered;
        }

        if self.spec.alarm_only_once_until_untriggered && self.was_triggered_before {
            return Observation::Suppressed;
        }

        self.last_triggered_at = Some(at);
        Observation::Triggered
    }

    /// Display text for the current state, if configured.
    pub fn state_text(&self) -> Option<&str> {
        if self.current_value.is_none() {
            return None;
        }

        if self.is_triggered() {
            self.spec.triggered_text.as_deref()
        } else {
            self.spec.untriggered_text.as_deref()
        }
    }
}
