//! Logging setup shared by the daemon and tools.
//!
//! Code inside the crate logs through [`prelude`] so that swapping the
//! backend never touches call sites.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod prelude {
    pub use ::tracing::{debug, error, info, trace, warn};
}

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to the systemd journal when running under it, stdout otherwise.
pub fn init_journald_or_stdout() {
    match tracing_journald::layer() {
        Ok(journald) if std::env::var_os("JOURNAL_STREAM").is_some() => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(journald)
                .init();
        }
        _ => init_stdout(),
    }
}

/// Log to stdout with local timestamps.
pub fn init_stdout() {
    let timer = fmt::time::LocalTime::rfc_3339();
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_timer(timer).with_target(false))
        .init();
}
