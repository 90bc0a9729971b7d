//! Alarm evaluation engine.
//!
//! One call to [`AlarmEvaluationEngine::evaluate_at`] is one cycle: it takes
//! a freshly fetched snapshot, works out which entries have not been seen,
//! runs every sensor over them, and returns the alarm lines per delivery
//! tier after snooze and flood control. The engine performs no I/O; the
//! caller fetches the snapshot, reads the snooze flag and delivers the
//! result.
//!
//! All mutable state lives in the engine and is only changed through
//! evaluation, so one engine must be owned by exactly one evaluation loop.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use time::OffsetDateTime;

use crate::alarm::{
    AlarmEvent, FloodClass, FloodControlGate, SnoozeState, StaleFeedLatch, StaleFeedMonitor,
    StaleStatus, Tier, format_timestamp,
};
use crate::config::{ConfigError, EngineSettings, validate_sensors};
use crate::feed::{ChannelMeta, FeedCursor, FeedSnapshot, Scan};
use crate::sensor::{Observation, Reading, SensorRuntime, SensorSpec};
use crate::tracing::prelude::*;

/// Output of one evaluation cycle, ready for delivery as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub user: Vec<String>,
    pub user_snooze_override: Vec<String>,
    pub admin: Vec<String>,
    pub admin_snooze_override: Vec<String>,

    /// Stale-feed alert for the admin audience.
    pub stale_feed: Option<String>,

    /// Every alarm raised this cycle (one per sensor), before snooze and
    /// flood control dropped any of them.
    pub events: Vec<AlarmEvent>,
}

impl EvaluationResult {
    pub fn tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::User => &self.user,
            Tier::UserSnoozeOverride => &self.user_snooze_override,
            Tier::Admin => &self.admin,
            Tier::AdminSnoozeOverride => &self.admin_snooze_override,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut Vec<String> {
        match tier {
            Tier::User => &mut self.user,
            Tier::UserSnoozeOverride => &mut self.user_snooze_override,
            Tier::Admin => &mut self.admin,
            Tier::AdminSnoozeOverride => &mut self.admin_snooze_override,
        }
    }

    /// True when there is nothing to deliver.
    pub fn is_empty(&self) -> bool {
        Tier::iter().all(|tier| self.tier(tier).is_empty()) && self.stale_feed.is_none()
    }
}

/// Read-only view of one sensor, for "last values" style displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub id: String,
    pub name: String,
    pub value: Option<String>,
    pub triggered: bool,
    pub text: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_triggered_at: Option<OffsetDateTime>,
}

pub struct AlarmEvaluationEngine {
    sensors: Vec<SensorRuntime>,
    cursor: FeedCursor,
    stale: StaleFeedMonitor,
    flood: FloodControlGate,
    /// Channel metadata from the most recent snapshot, for field labels.
    channel: ChannelMeta,
}

impl AlarmEvaluationEngine {
    pub fn new(sensors: Vec<SensorSpec>, settings: EngineSettings) -> Result<Self, ConfigError> {
        validate_sensors(&sensors)?;

        Ok(Self {
            sensors: sensors.into_iter().map(SensorRuntime::new).collect(),
            cursor: FeedCursor::new(),
            stale: StaleFeedMonitor::new(settings.no_data_threshold_seconds),
            flood: FloodControlGate::new(
                settings.flood.alarm_min_interval_seconds,
                settings.flood.no_data_min_interval_seconds,
            ),
            channel: ChannelMeta::default(),
        })
    }

    pub fn cursor(&self) -> &FeedCursor {
        &self.cursor
    }

    pub fn stale_latch(&self) -> StaleFeedLatch {
        self.stale.latch_state()
    }

    pub fn flood_gate(&self) -> &FloodControlGate {
        &self.flood
    }

    pub fn sensors(&self) -> &[SensorRuntime] {
        &self.sensors
    }

    /// Retune the stale-feed threshold. `-1` disables the monitor.
    pub fn set_no_data_threshold(&mut self, seconds: i64) {
        self.stale.set_threshold(seconds);
    }

    pub fn sensor_statuses(&self) -> Vec<SensorStatus> {
        self.sensors
            .iter()
            .map(|sensor| {
                let spec = sensor.spec();
                SensorStatus {
                    id: spec.id.clone(),
                    name: display_name(spec, &self.channel),
                    value: sensor.current_value().map(|v| v.to_string()),
                    triggered: sensor.is_triggered(),
                    text: sensor.state_text().map(str::to_string),
                    last_triggered_at: sensor.last_triggered_at(),
                }
            })
            .collect()
    }

    /// Run one cycle against the wall clock.
    pub fn evaluate(&mut self, snapshot: &FeedSnapshot, snooze: &SnoozeState) -> EvaluationResult {
        self.evaluate_at(snapshot, snooze, OffsetDateTime::now_utc())
    }

    /// Run one cycle as of `now`.
    pub fn evaluate_at(
        &mut self,
        snapshot: &FeedSnapshot,
        snooze: &SnoozeState,
        now: OffsetDateTime,
    ) -> EvaluationResult {
        self.channel.clone_from(&snapshot.channel);

        let Some(current) = snapshot.channel.last_entry_id else {
            debug!(channel = %snapshot.channel.name, "Feed has no entries yet");
            return EvaluationResult::default();
        };

        let scan = self.cursor.scan(current);
        match scan {
            Scan::Baseline => {
                self.adopt_baseline(snapshot, current, now);
                EvaluationResult::default()
            }
            Scan::NoNewData => self.check_stale(now),
            Scan::Resync { previous } => {
                info!(
                    previous,
                    current, "Feed went backwards (channel reset?), checking all entries"
                );
                self.process(snapshot, scan, current, snooze, now)
            }
            Scan::Advance { after } => {
                debug!(after, current, "Checking new entries");
                self.process(snapshot, scan, current, snooze, now)
            }
        }
    }

    fn adopt_baseline(&mut self, snapshot: &FeedSnapshot, current: u64, now: OffsetDateTime) {
        if let Some(newest) = snapshot.newest_timestamp() {
            self.cursor.record_sensor_update(newest);
        }
        self.cursor.commit(current, now);
        info!(
            channel = %snapshot.channel.name,
            last_entry_id = current,
            "Adopted feed baseline, existing entries are not evaluated"
        );
    }

    fn process(
        &mut self,
        snapshot: &FeedSnapshot,
        scan: Scan,
        current: u64,
        snooze: &SnoozeState,
        now: OffsetDateTime,
    ) -> EvaluationResult {
        let mut events = Vec::new();
        // One event per configured sensor per cycle, the earliest one.
        let mut raised = vec![false; self.sensors.len()];

        for entry in snapshot
            .entries
            .iter()
            .filter(|entry| scan.is_unseen(entry.entry_id))
        {
            let Some(at) = entry.timestamp() else {
                debug!(
                    entry_id = entry.entry_id,
                    created_at = %entry.created_at,
                    "Skipping entry with unparseable timestamp"
                );
                continue;
            };
            self.cursor.record_sensor_update(at);

            for (sensor, raised) in self.sensors.iter_mut().zip(raised.iter_mut()) {
                let Some(raw) = entry.raw_field(&sensor.spec().id) else {
                    continue;
                };
                let Some(value) = Reading::parse(&raw) else {
                    debug!(
                        entry_id = entry.entry_id,
                        field = %sensor.spec().id,
                        raw = %raw,
                        "Skipping non-numeric field value"
                    );
                    continue;
                };

                match sensor.observe(value, at) {
                    Observation::Triggered if *raised => {}
                    Observation::Triggered => {
                        *raised = true;
                        events.push(AlarmEvent {
                            sensor_name: display_name(sensor.spec(), &snapshot.channel),
                            occurred_at: at,
                            tier: sensor.spec().tier(),
                        });
                    }
                    Observation::Suppressed => debug!(
                        sensor = %display_name(sensor.spec(), &snapshot.channel),
                        entry_id = entry.entry_id,
                        "Ignoring alarm, sensor alarms only once until untriggered"
                    ),
                    Observation::Untriggered => {}
                }
            }
        }

        // The feed moved, whether or not anything triggered.
        self.cursor.commit(current, now);
        self.stale.reset();

        self.route(events, snooze, now)
    }

    fn route(
        &mut self,
        events: Vec<AlarmEvent>,
        snooze: &SnoozeState,
        now: OffsetDateTime,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::default();
        let snoozed = snooze.is_active(now);

        for tier in Tier::iter() {
            let lines: Vec<String> = events
                .iter()
                .filter(|event| event.tier == tier)
                .map(AlarmEvent::line)
                .collect();
            if lines.is_empty() {
                continue;
            }

            if snoozed && !tier.overrides_snooze() {
                info!(
                    tier = %tier,
                    count = lines.len(),
                    snoozed_by = snooze.snoozed_by.as_deref().unwrap_or("unknown"),
                    "Suppressing alarms while notifications are snoozed"
                );
                continue;
            }

            if self.flood.admit(FloodClass::Alarm(tier), lines.len(), now) {
                warn!(tier = %tier, alarms = ?lines, "Sending out alarms");
                *result.tier_mut(tier) = lines;
            }
        }

        result.events = events;
        result
    }

    fn check_stale(&mut self, now: OffsetDateTime) -> EvaluationResult {
        let changed_at = self.cursor.last_entry_id_changed_at().unwrap_or(now);
        let last_update = self
            .cursor
            .last_sensor_update_at()
            .map(format_timestamp)
            .unwrap_or_else(|| "unknown".to_string());

        debug!(
            last_entry_id = ?self.cursor.last_entry_id(),
            last_update = %last_update,
            "No new data available"
        );

        let mut result = EvaluationResult::default();
        if self.stale.check(now - changed_at) != StaleStatus::Stale {
            return result;
        }

        warn!(last_update = %last_update, "Got no new sensor data for a long time");
        if self.flood.admit(FloodClass::NoData, 1, now) {
            self.stale.latch();
            result.stale_feed = Some(format!(
                "Alarm system error! No new sensor data available. Last sensor data from: {last_update}"
            ));
        }
        result
    }
}

/// Name shown in alarm lines: the configured name, else the channel's field
/// label, else the field id. Names need not be unique; sensors are told
/// apart by id.
fn display_name(spec: &SensorSpec, channel: &ChannelMeta) -> String {
    if !spec.name.is_empty() {
        return spec.name.clone();
    }
    channel
        .field_label(&spec.id)
        .unwrap_or(spec.id.as_str())
        .to_string()
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use time::macros::datetime;

    use super::*;
    use crate::config::FloodConfig;
    use crate::feed::FeedEntry;
    use crate::sensor::TriggerOperator;

    const T0: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

    fn at(secs: i64) -> OffsetDateTime {
        T0 + Duration::seconds(secs)
    }

    fn ts(secs: i64) -> String {
        format_timestamp(at(secs))
    }

    fn line(secs: i64, name: &str) -> String {
        format!("{} | {}", ts(secs), name)
    }

    fn entry(id: u64, secs: i64, door: &str) -> FeedEntry {
        FeedEntry::new(id, ts(secs)).with_field("field1", door)
    }

    fn snapshot(last_entry_id: u64, entries: Vec<FeedEntry>) -> FeedSnapshot {
        FeedSnapshot::new(ChannelMeta::new("Garage", last_entry_id), entries)
    }

    fn door() -> SensorSpec {
        SensorSpec::new("field1", "Door", 1.0)
    }

    fn settings(no_data_threshold_seconds: i64, no_data_min_interval_seconds: i64) -> EngineSettings {
        EngineSettings {
            no_data_threshold_seconds,
            flood: FloodConfig {
                alarm_min_interval_seconds: 60,
                no_data_min_interval_seconds,
            },
        }
    }

    fn engine(specs: Vec<SensorSpec>) -> AlarmEvaluationEngine {
        AlarmEvaluationEngine::new(specs, settings(600, -1)).unwrap()
    }

    fn not_snoozed() -> SnoozeState {
        SnoozeState::default()
    }

    /// Engine that has already adopted entry `id` as its baseline at T0.
    fn engine_after_baseline(specs: Vec<SensorSpec>, id: u64) -> AlarmEvaluationEngine {
        let mut engine = engine(specs);
        let result = engine.evaluate_at(&snapshot(id, vec![entry(id, 0, "0")]), &not_snoozed(), T0);
        assert!(result.is_empty());
        engine
    }

    #[test]
    fn first_cycle_adopts_baseline_without_alarms() {
        let mut engine = engine(vec![door()]);

        let result = engine.evaluate_at(
            &snapshot(3, vec![entry(1, 0, "1"), entry(2, 5, "1"), entry(3, 10, "1")]),
            &not_snoozed(),
            at(20),
        );

        assert_eq!(result, EvaluationResult::default());
        assert_eq!(engine.cursor().last_entry_id(), Some(3));
        assert_eq!(engine.cursor().last_entry_id_changed_at(), Some(at(20)));
        assert_eq!(engine.cursor().last_sensor_update_at(), Some(at(10)));
        assert_eq!(engine.sensors()[0].current_value(), None);
    }

    #[test]
    fn door_example_lands_in_user_tier() {
        let mut engine = engine_after_baseline(vec![door()], 4);

        let result = engine.evaluate_at(
            &snapshot(5, vec![entry(4, 0, "0"), entry(5, 10, "1")]),
            &not_snoozed(),
            at(15),
        );

        assert_eq!(result.user, vec![line(10, "Door")]);
        assert!(result.user_snooze_override.is_empty());
        assert!(result.admin.is_empty());
        assert!(result.admin_snooze_override.is_empty());
        assert_eq!(result.stale_feed, None);
    }

    #[test]
    fn cursor_follows_non_decreasing_feed() {
        let mut engine = engine(vec![door()]);
        let ids = [10u64, 12, 12, 15, 20, 20, 21];

        for (i, id) in ids.into_iter().enumerate() {
            let secs = i as i64 * 5;
            engine.evaluate_at(&snapshot(id, vec![entry(id, secs, "0")]), &not_snoozed(), at(secs));
            assert_eq!(engine.cursor().last_entry_id(), Some(id));
        }
    }

    #[test]
    fn feed_reset_evaluates_every_entry() {
        let mut engine = engine_after_baseline(vec![door()], 100);

        let result = engine.evaluate_at(
            &snapshot(40, vec![entry(38, 10, "1"), entry(39, 20, "0"), entry(40, 30, "0")]),
            &not_snoozed(),
            at(35),
        );

        assert_eq!(result.user, vec![line(10, "Door")]);
        assert_eq!(engine.cursor().last_entry_id(), Some(40));
        assert_eq!(engine.cursor().last_sensor_update_at(), Some(at(30)));
    }

    #[test]
    fn only_entries_above_cursor_are_evaluated() {
        let mut engine = engine_after_baseline(vec![door()], 10);

        let result = engine.evaluate_at(
            &snapshot(11, vec![entry(9, 0, "1"), entry(10, 1, "1"), entry(11, 2, "0")]),
            &not_snoozed(),
            at(5),
        );

        assert!(result.events.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn continuous_trigger_alarms_once_with_hysteresis() {
        let mut engine = engine_after_baseline(vec![door().alarm_only_once()], 0);

        let result = engine.evaluate_at(
            &snapshot(3, vec![entry(1, 10, "1"), entry(2, 20, "1"), entry(3, 30, "1")]),
            &not_snoozed(),
            at(40),
        );

        assert_eq!(result.user, vec![line(10, "Door")]);
        assert_eq!(engine.sensors()[0].last_triggered_at(), Some(at(10)));
    }

    #[test]
    fn retrigger_keeps_earliest_line_per_cycle() {
        let mut engine = engine_after_baseline(vec![door().alarm_only_once()], 0);

        let result = engine.evaluate_at(
            &snapshot(3, vec![entry(1, 10, "1"), entry(2, 20, "0"), entry(3, 30, "1")]),
            &not_snoozed(),
            at(40),
        );

        // Two transitions happened, the earliest one is reported
        assert_eq!(result.user, vec![line(10, "Door")]);
        assert_eq!(result.events.len(), 1);
        assert_eq!(engine.sensors()[0].last_triggered_at(), Some(at(30)));
    }

    #[test]
    fn hysteresis_spans_cycles() {
        let mut engine = engine_after_baseline(vec![door().alarm_only_once()], 0);

        let first = engine.evaluate_at(&snapshot(1, vec![entry(1, 10, "1")]), &not_snoozed(), at(10));
        assert_eq!(first.user.len(), 1);

        let second =
            engine.evaluate_at(&snapshot(2, vec![entry(2, 100, "1")]), &not_snoozed(), at(100));
        assert!(second.events.is_empty());
        assert!(second.user.is_empty());
    }

    #[test]
    fn tiers_follow_audience_and_override_flags() {
        let specs = vec![
            SensorSpec::new("field1", "Door", 1.0),
            SensorSpec::new("field2", "Siren", 1.0).overriding_snooze(),
            SensorSpec::new("field3", "Tamper", 1.0).admin_only(),
            SensorSpec::new("field4", "Power", 1.0)
                .admin_only()
                .overriding_snooze(),
        ];
        let mut engine = engine_after_baseline(specs, 0);

        let mut e = FeedEntry::new(1, ts(10));
        for field in ["field1", "field2", "field3", "field4"] {
            e = e.with_field(field, "1");
        }
        let result = engine.evaluate_at(&snapshot(1, vec![e]), &not_snoozed(), at(10));

        assert_eq!(result.user, vec![line(10, "Door")]);
        assert_eq!(result.user_snooze_override, vec![line(10, "Siren")]);
        assert_eq!(result.admin, vec![line(10, "Tamper")]);
        assert_eq!(result.admin_snooze_override, vec![line(10, "Power")]);
    }

    #[test]
    fn snooze_suppresses_only_tiers_without_override() {
        let specs = vec![
            SensorSpec::new("field1", "Door", 1.0),
            SensorSpec::new("field3", "Tamper", 1.0).admin_only(),
            SensorSpec::new("field4", "Power", 1.0)
                .admin_only()
                .overriding_snooze(),
        ];
        let mut engine = engine_after_baseline(specs, 0);
        let snooze = SnoozeState::until(at(3600), "alice");

        let e = FeedEntry::new(1, ts(10))
            .with_field("field1", "1")
            .with_field("field3", "1")
            .with_field("field4", "1");
        let result = engine.evaluate_at(&snapshot(1, vec![e]), &snooze, at(10));

        assert!(result.user.is_empty());
        assert!(result.admin.is_empty());
        assert_eq!(result.admin_snooze_override, vec![line(10, "Power")]);
        assert_eq!(result.events.len(), 3);

        // Suppressed tiers did not start a flood window
        let user_gate = engine.flood_gate().state(FloodClass::Alarm(Tier::User)).unwrap();
        assert_eq!(user_gate.last_sent_at(), None);
    }

    #[test]
    fn expired_snooze_lets_everything_through() {
        let mut engine = engine_after_baseline(vec![door()], 0);
        let snooze = SnoozeState::until(at(5), "alice");

        let result = engine.evaluate_at(&snapshot(1, vec![entry(1, 10, "1")]), &snooze, at(10));

        assert_eq!(result.user, vec![line(10, "Door")]);
    }

    #[test]
    fn flood_control_drops_repeat_within_interval() {
        let mut engine = engine_after_baseline(vec![door()], 0);

        let first = engine.evaluate_at(&snapshot(1, vec![entry(1, 100, "1")]), &not_snoozed(), at(100));
        assert_eq!(first.user.len(), 1);

        let second =
            engine.evaluate_at(&snapshot(2, vec![entry(2, 110, "1")]), &not_snoozed(), at(110));
        assert!(second.user.is_empty());
        assert_eq!(second.events.len(), 1);

        let third = engine.evaluate_at(&snapshot(3, vec![entry(3, 160, "1")]), &not_snoozed(), at(160));
        assert_eq!(third.user, vec![line(160, "Door")]);
    }

    #[test]
    fn flood_interval_beyond_calendar_keeps_dropping() {
        let mut settings = settings(600, -1);
        settings.flood.alarm_min_interval_seconds = i64::MAX;
        let mut engine = AlarmEvaluationEngine::new(vec![door()], settings).unwrap();
        engine.evaluate_at(&snapshot(0, vec![entry(0, 0, "0")]), &not_snoozed(), T0);

        let first = engine.evaluate_at(&snapshot(1, vec![entry(1, 10, "1")]), &not_snoozed(), at(10));
        assert_eq!(first.user, vec![line(10, "Door")]);

        let second = engine.evaluate_at(&snapshot(2, vec![entry(2, 20, "1")]), &not_snoozed(), at(20));
        assert!(second.user.is_empty());
        assert_eq!(second.events.len(), 1);
    }

    #[test]
    fn stale_feed_fires_once_per_stall() {
        let mut engine = engine_after_baseline(vec![door()], 7);
        let same = || snapshot(7, vec![entry(7, 0, "0")]);

        assert!(engine.evaluate_at(&same(), &not_snoozed(), at(300)).is_empty());

        let fired = engine.evaluate_at(&same(), &not_snoozed(), at(650));
        let message = fired.stale_feed.expect("stale alert after threshold");
        assert!(message.contains(&ts(0)));
        assert!(engine.stale_latch().has_fired);

        let repeat = engine.evaluate_at(&same(), &not_snoozed(), at(700));
        assert_eq!(repeat.stale_feed, None);

        // Data moves again: latch clears even though nothing triggered
        let moved = engine.evaluate_at(&snapshot(8, vec![entry(8, 710, "0")]), &not_snoozed(), at(710));
        assert!(moved.is_empty());
        assert!(!engine.stale_latch().has_fired);

        let stalled = || snapshot(8, vec![entry(8, 710, "0")]);
        assert_eq!(engine.evaluate_at(&stalled(), &not_snoozed(), at(1000)).stale_feed, None);
        let again = engine.evaluate_at(&stalled(), &not_snoozed(), at(1360));
        assert!(again.stale_feed.unwrap().contains(&ts(710)));
    }

    #[test]
    fn stale_monitor_can_be_disabled() {
        let mut engine = AlarmEvaluationEngine::new(vec![door()], settings(-1, -1)).unwrap();
        engine.evaluate_at(&snapshot(1, vec![]), &not_snoozed(), T0);

        let result = engine.evaluate_at(&snapshot(1, vec![]), &not_snoozed(), at(1_000_000));
        assert_eq!(result.stale_feed, None);
    }

    #[test]
    fn stale_threshold_can_be_retuned() {
        let mut engine = engine_after_baseline(vec![door()], 1);
        engine.set_no_data_threshold(60);

        let result = engine.evaluate_at(&snapshot(1, vec![]), &not_snoozed(), at(61));
        assert!(result.stale_feed.is_some());
    }

    #[test]
    fn stale_alert_held_by_flood_control_is_retried() {
        let mut engine = AlarmEvaluationEngine::new(vec![door()], settings(600, 3600)).unwrap();
        engine.evaluate_at(&snapshot(1, vec![]), &not_snoozed(), T0);

        assert!(engine.evaluate_at(&snapshot(1, vec![]), &not_snoozed(), at(650)).stale_feed.is_some());
        engine.evaluate_at(&snapshot(2, vec![entry(2, 700, "0")]), &not_snoozed(), at(700));

        // Second stall is due at 1300 but the no-data window runs until 4250
        let held = engine.evaluate_at(&snapshot(2, vec![]), &not_snoozed(), at(1400));
        assert_eq!(held.stale_feed, None);
        assert!(!engine.stale_latch().has_fired);

        let retried = engine.evaluate_at(&snapshot(2, vec![]), &not_snoozed(), at(4250));
        assert!(retried.stale_feed.is_some());
    }

    #[test]
    fn stale_alert_ignores_snooze() {
        let mut engine = engine_after_baseline(vec![door()], 1);
        let snooze = SnoozeState::until(at(100_000), "alice");

        let result = engine.evaluate_at(&snapshot(1, vec![]), &snooze, at(650));
        assert!(result.stale_feed.is_some());
    }

    #[test]
    fn malformed_fields_are_skipped_without_aborting() {
        let specs = vec![door(), SensorSpec::new("field2", "Battery", 3.3).with_operator(TriggerOperator::Less)];
        let mut engine = engine_after_baseline(specs, 0);

        let entries = vec![
            FeedEntry::new(1, ts(10))
                .with_field("field1", "ERR")
                .with_field("field2", "3.1"),
            FeedEntry::new(2, "yesterday").with_field("field1", "1"),
            FeedEntry::new(3, ts(30)).with_field("field2", "3.0"),
        ];
        let result = engine.evaluate_at(&snapshot(3, entries), &not_snoozed(), at(40));

        assert_eq!(result.user, vec![line(10, "Battery")]);
        assert_eq!(engine.sensors()[0].current_value(), None);
        assert_eq!(engine.cursor().last_entry_id(), Some(3));
        assert_eq!(engine.cursor().last_sensor_update_at(), Some(at(30)));
    }

    #[test]
    fn empty_channel_is_a_no_op() {
        let mut engine = engine(vec![door()]);
        let empty = FeedSnapshot::default();

        let result = engine.evaluate_at(&empty, &not_snoozed(), T0);

        assert!(result.is_empty());
        assert_eq!(engine.cursor(), &FeedCursor::new());
    }

    #[test]
    fn unnamed_sensor_uses_channel_label() {
        let mut engine = engine_after_baseline(
            vec![
                SensorSpec::new("field1", "", 1.0),
                SensorSpec::new("field2", "", 1.0),
            ],
            0,
        );
        let channel = ChannelMeta::new("Garage", 1).with_label("field1", "Front door");
        let e = FeedEntry::new(1, ts(10))
            .with_field("field1", "1")
            .with_field("field2", "1");

        let result = engine.evaluate_at(&FeedSnapshot::new(channel, vec![e]), &not_snoozed(), at(10));

        assert_eq!(result.user, vec![line(10, "Front door"), line(10, "field2")]);
        assert_eq!(engine.sensor_statuses()[0].name, "Front door");
    }

    #[test]
    fn sensors_sharing_a_label_alarm_separately() {
        let mut engine = engine_after_baseline(
            vec![
                SensorSpec::new("field1", "", 1.0),
                SensorSpec::new("field2", "", 1.0),
            ],
            0,
        );
        let channel = ChannelMeta::new("Garage", 2)
            .with_label("field1", "Door")
            .with_label("field2", "Door");
        let entries = vec![
            FeedEntry::new(1, ts(10)).with_field("field1", "1"),
            FeedEntry::new(2, ts(20)).with_field("field2", "1"),
        ];

        let result =
            engine.evaluate_at(&FeedSnapshot::new(channel, entries), &not_snoozed(), at(20));

        assert_eq!(result.user, vec![line(10, "Door"), line(20, "Door")]);
        assert_eq!(result.events.len(), 2);
    }

    #[test]
    fn sensor_statuses_expose_last_values() {
        let mut spec = door();
        spec.triggered_text = Some("open".into());
        let mut engine = engine_after_baseline(vec![spec, SensorSpec::new("field2", "", 0.0)], 0);

        engine.evaluate_at(&snapshot(1, vec![entry(1, 10, "1")]), &not_snoozed(), at(10));
        let statuses = engine.sensor_statuses();

        assert_eq!(statuses[0].name, "Door");
        assert_eq!(statuses[0].value.as_deref(), Some("1"));
        assert!(statuses[0].triggered);
        assert_eq!(statuses[0].text.as_deref(), Some("open"));
        assert_eq!(statuses[0].last_triggered_at, Some(at(10)));
        assert_eq!(statuses[1].name, "field2");
        assert_eq!(statuses[1].value, None);
        assert!(!statuses[1].triggered);
    }

    #[test]
    fn rejects_duplicate_sensor_ids() {
        let result = AlarmEvaluationEngine::new(vec![door(), door()], EngineSettings::default());
        assert!(matches!(result, Err(ConfigError::DuplicateSensorId(_))));
    }
}
