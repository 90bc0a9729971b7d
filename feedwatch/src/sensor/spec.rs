use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::alarm::Tier;

/// Comparison applied between a reading and a sensor's trigger value.
///
/// Only these three operators exist. Anything else is rejected when the
/// configuration is deserialized, never during evaluation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TriggerOperator {
    Less,
    More,
    #[default]
    Equal,
}

/// Comparison resolved once from a [`TriggerOperator`]: `(value, threshold)`.
pub type Predicate = fn(f64, f64) -> bool;

impl TriggerOperator {
    pub fn predicate(self) -> Predicate {
        fn less(value: f64, threshold: f64) -> bool {
            value < threshold
        }
        fn more(value: f64, threshold: f64) -> bool {
            value > threshold
        }
        fn equal(value: f64, threshold: f64) -> bool {
            value == threshold
        }

        match self {
            TriggerOperator::Less => less,
            TriggerOperator::More => more,
            TriggerOperator::Equal => equal,
        }
    }
}

/// Static description of one trackable quantity in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Feed field key this sensor reads, e.g. `field1`.
    pub id: String,

    /// Human label. When empty, the channel's label for `id` is used.
    #[serde(default)]
    pub name: String,

    #[serde(rename = "trigger")]
    pub trigger_value: f64,

    #[serde(rename = "operator", default)]
    pub trigger_operator: TriggerOperator,

    /// Suppress repeat alarms while the sensor stays triggered.
    #[serde(default)]
    pub alarm_only_once_until_untriggered: bool,

    /// Alarm is delivered even while notifications are snoozed.
    #[serde(default)]
    pub overrides_snooze: bool,

    /// Alarm goes to the restricted admin audience only.
    #[serde(default)]
    pub admin_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untriggered_text: Option<String>,
}

impl SensorSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger_value: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger_value,
            trigger_operator: TriggerOperator::default(),
            alarm_only_once_until_untriggered: false,
            overrides_snooze: false,
            admin_only: false,
            triggered_text: None,
            untriggered_text: None,
        }
    }

    pub fn with_operator(mut self, operator: TriggerOperator) -> Self {
        self.trigger_operator = operator;
        self
    }

    pub fn alarm_only_once(mut self) -> Self {
        self.alarm_only_once_until_untriggered = true;
        self
    }

    pub fn overriding_snooze(mut self) -> Self {
        self.overrides_snooze = true;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    pub fn tier(&self) -> Tier {
        Tier::classify(self.admin_only, self.overrides_snooze)
    }
}
