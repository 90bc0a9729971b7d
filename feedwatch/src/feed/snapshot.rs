//! Feed snapshot as returned by the channel feed endpoint.
//!
//! ```json
//! {
//!   "channel": {"name": "Garage", "field1": "Door", "last_entry_id": 120},
//!   "feeds": [{"entry_id": 120, "created_at": "2021-04-18T10:00:00Z", "field1": "1"}]
//! }
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Channel metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeta {
    #[serde(default)]
    pub name: String,

    /// Highest entry id in the channel. Absent for a channel with no data.
    #[serde(default)]
    pub last_entry_id: Option<u64>,

    /// Everything else, including field labels (`field1: "Door"`).
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ChannelMeta {
    pub fn new(name: impl Into<String>, last_entry_id: u64) -> Self {
        Self {
            name: name.into(),
            last_entry_id: Some(last_entry_id),
            extra: HashMap::new(),
        }
    }

    pub fn with_label(mut self, field: &str, label: &str) -> Self {
        self.extra.insert(field.to_string(), Value::from(label));
        self
    }

    /// The channel's label for a field, e.g. `Door` for `field1`.
    pub fn field_label(&self, field: &str) -> Option<&str> {
        self.extra
            .get(field)
            .and_then(Value::as_str)
            .filter(|label| !label.is_empty())
    }
}

/// One row of the append-only feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub entry_id: u64,

    /// ISO-8601 timestamp with offset.
    pub created_at: String,

    /// Field id to raw value. Values are usually strings but may be null,
    /// numbers or arbitrary fault text.
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl FeedEntry {
    pub fn new(entry_id: u64, created_at: impl Into<String>) -> Self {
        Self {
            entry_id,
            created_at: created_at.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, field: &str, raw: &str) -> Self {
        self.fields.insert(field.to_string(), Value::from(raw));
        self
    }

    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.created_at, &Rfc3339).ok()
    }

    /// Raw value of a field, if present and not null.
    pub fn raw_field(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.fields.get(field)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }
}

/// One fetch of the feed: channel metadata plus entries, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub channel: ChannelMeta,
    #[serde(rename = "feeds", default)]
    pub entries: Vec<FeedEntry>,
}

impl FeedSnapshot {
    pub fn new(channel: ChannelMeta, entries: Vec<FeedEntry>) -> Self {
        Self { channel, entries }
    }

    /// Timestamp of the newest entry that carries a parseable one.
    pub fn newest_timestamp(&self) -> Option<OffsetDateTime> {
        self.entries.iter().rev().find_map(FeedEntry::timestamp)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const SAMPLE: &str = r#"{
        "channel": {
            "id": 12345,
            "name": "Garage",
            "field1": "Door",
            "field2": "Battery",
            "created_at": "2021-01-01T00:00:00Z",
            "last_entry_id": 121
        },
        "feeds": [
            {"created_at": "2021-04-18T10:00:00+02:00", "entry_id": 120, "field1": "0", "field2": "3.71"},
            {"created_at": "2021-04-18T10:05:00+02:00", "entry_id": 121, "field1": "1", "field2": null}
        ]
    }"#;

    #[test]
    fn should_decode_channel_feed() {
        let snapshot: FeedSnapshot = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(snapshot.channel.name, "Garage");
        assert_eq!(snapshot.channel.last_entry_id, Some(121));
        assert_eq!(snapshot.channel.field_label("field1"), Some("Door"));
        assert_eq!(snapshot.channel.field_label("field3"), None);
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].raw_field("field2").as_deref(), Some("3.71"));
        assert_eq!(snapshot.entries[1].raw_field("field2"), None);
        assert_eq!(
            snapshot.newest_timestamp(),
            Some(datetime!(2021-04-18 10:05:00 +02:00))
        );
    }

    #[test]
    fn should_decode_empty_channel() {
        let snapshot: FeedSnapshot =
            serde_json::from_str(r#"{"channel": {"name": "New", "last_entry_id": null}, "feeds": []}"#)
                .unwrap();
        assert_eq!(snapshot.channel.last_entry_id, None);
        assert_eq!(snapshot.newest_timestamp(), None);
    }

    #[test]
    fn should_render_numeric_fields_as_raw_text() {
        let entry: FeedEntry =
            serde_json::from_str(r#"{"entry_id": 1, "created_at": "x", "field1": 7}"#).unwrap();
        assert_eq!(entry.raw_field("field1").as_deref(), Some("7"));
        assert_eq!(entry.timestamp(), None);
    }
}
