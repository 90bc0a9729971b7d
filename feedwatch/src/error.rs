//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FeedError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

pub type Result<T> = std::result::Result<T, Error>;
