//! Alarm evaluation and notification routing for append-only sensor feeds.
//!
//! The daemon polls a feed, evaluates every configured sensor against the
//! entries it has not seen yet, and routes the resulting alarm lines into
//! four delivery tiers after snooze and flood control.

pub mod alarm;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod notify;
pub mod scheduler;
pub mod sensor;
pub mod tracing;

pub use config::Config;
pub use engine::{AlarmEvaluationEngine, EvaluationResult, SensorStatus};
pub use error::{Error, Result};
