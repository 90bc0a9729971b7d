//! Alarm classification and the gates every batch passes before delivery.

mod flood;
mod snooze;
mod stale;
mod tier;

pub use flood::{FloodClass, FloodControlGate, FloodControlState};
pub use snooze::{NoSnooze, SnoozeFile, SnoozeSource, SnoozeState};
pub use stale::{StaleFeedLatch, StaleFeedMonitor, StaleStatus};
pub use tier::{AlarmEvent, Tier, format_timestamp};
