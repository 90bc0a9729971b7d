use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Delivery tier of an alarm, derived from a sensor's audience and
/// snooze-override flags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    User,
    UserSnoozeOverride,
    Admin,
    AdminSnoozeOverride,
}

impl Tier {
    pub fn classify(admin_only: bool, overrides_snooze: bool) -> Self {
        match (admin_only, overrides_snooze) {
            (false, false) => Tier::User,
            (false, true) => Tier::UserSnoozeOverride,
            (true, false) => Tier::Admin,
            (true, true) => Tier::AdminSnoozeOverride,
        }
    }

    pub fn overrides_snooze(self) -> bool {
        matches!(self, Tier::UserSnoozeOverride | Tier::AdminSnoozeOverride)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Tier::Admin | Tier::AdminSnoozeOverride)
    }
}

/// One sensor transition into the triggered state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub sensor_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub tier: Tier,
}

impl AlarmEvent {
    /// Render as `timestamp | sensor name`, ready for delivery.
    pub fn line(&self) -> String {
        format!("{} | {}", format_timestamp(self.occurred_at), self.sensor_name)
    }
}

/// RFC 3339 rendering used in every delivered message.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;
    use test_case::test_case;
    use time::macros::datetime;

    use super::*;

    #[test_case(false, false, Tier::User; "user")]
    #[test_case(false, true, Tier::UserSnoozeOverride; "user_override")]
    #[test_case(true, false, Tier::Admin; "admin")]
    #[test_case(true, true, Tier::AdminSnoozeOverride; "admin_override")]
    fn should_classify_tier(admin_only: bool, overrides_snooze: bool, expected: Tier) {
        let tier = Tier::classify(admin_only, overrides_snooze);
        assert_eq!(tier, expected);
        assert_eq!(tier.is_admin(), admin_only);
        assert_eq!(tier.overrides_snooze(), overrides_snooze);
    }

    #[test]
    fn should_list_tiers_in_delivery_order() {
        let tiers: Vec<_> = Tier::iter().collect();
        assert_eq!(
            tiers,
            vec![
                Tier::User,
                Tier::UserSnoozeOverride,
                Tier::Admin,
                Tier::AdminSnoozeOverride
            ]
        );
        assert_eq!(Tier::AdminSnoozeOverride.to_string(), "ADMIN_SNOOZE_OVERRIDE");
    }

    #[test]
    fn should_format_line_with_feed_timestamp() {
        let event = AlarmEvent {
            sensor_name: "Door".into(),
            occurred_at: datetime!(2021-04-18 10:15:00 +02:00),
            tier: Tier::User,
        };
        assert_eq!(event.line(), "2021-04-18T10:15:00+02:00 | Door");
    }
}
