//! The remote append-only feed: snapshots, fetching and the read cursor.

mod client;
mod cursor;
mod snapshot;

pub use client::{FeedError, FeedSource, HttpFeed};
pub use cursor::{FeedCursor, Scan};
pub use snapshot::{ChannelMeta, FeedEntry, FeedSnapshot};
