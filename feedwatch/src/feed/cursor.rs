use time::OffsetDateTime;

/// How a new snapshot relates to what has already been examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// First snapshot ever. Adopt it as the baseline, evaluate nothing.
    Baseline,

    /// Feed has not moved since the last cycle.
    NoNewData,

    /// Feed went backwards (channel reset or rotated). Every entry in the
    /// snapshot is treated as unseen.
    Resync { previous: u64 },

    /// Normal progress. Entries with an id above `after` are unseen.
    Advance { after: u64 },
}

impl Scan {
    pub fn is_unseen(&self, entry_id: u64) -> bool {
        match self {
            Scan::Baseline | Scan::NoNewData => false,
            Scan::Resync { .. } => true,
            Scan::Advance { after } => entry_id > *after,
        }
    }
}

/// Position in the append-only feed.
///
/// `last_entry_id` only moves forward, except when the feed itself reports
/// a lower id than before (see [`Scan::Resync`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCursor {
    last_entry_id: Option<u64>,
    last_entry_id_changed_at: Option<OffsetDateTime>,
    last_sensor_update_at: Option<OffsetDateTime>,
}

impl FeedCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_entry_id(&self) -> Option<u64> {
        self.last_entry_id
    }

    pub fn last_entry_id_changed_at(&self) -> Option<OffsetDateTime> {
        self.last_entry_id_changed_at
    }

    /// Timestamp of the newest entry evaluated so far.
    pub fn last_sensor_update_at(&self) -> Option<OffsetDateTime> {
        self.last_sensor_update_at
    }

    /// Classify a snapshot reporting `current_last_entry_id`. Does not mutate.
    pub fn scan(&self, current_last_entry_id: u64) -> Scan {
        match self.last_entry_id {
            None => Scan::Baseline,
            Some(last) if current_last_entry_id == last => Scan::NoNewData,
            Some(last) if current_last_entry_id < last => Scan::Resync { previous: last },
            Some(last) => Scan::Advance { after: last },
        }
    }

    /// Move to `current_last_entry_id`, recording `now` as the time the feed
    /// last moved. Used for the baseline, resync and normal progress alike.
    pub fn commit(&mut self, current_last_entry_id: u64, now: OffsetDateTime) {
        self.last_entry_id = Some(current_last_entry_id);
        self.last_entry_id_changed_at = Some(now);
    }

    pub fn record_sensor_update(&mut self, at: OffsetDateTime) {
        self.last_sensor_update_at = Some(at);
    }
}
