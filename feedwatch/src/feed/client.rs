//! Fetching feed snapshots over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::snapshot::FeedSnapshot;
use crate::config::FeedConfig;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of feed snapshots, one per scheduler tick.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError>;
}

/// Channel feed served over HTTP in the ThingSpeak JSON layout.
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
    read_api_key: Option<String>,
}

impl HttpFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            url: Self::feed_url(&config.base_url, config.channel),
            read_api_key: config.read_api_key.clone(),
        })
    }

    fn feed_url(base_url: &str, channel: u64) -> String {
        format!("{}/channels/{}/feed.json", base_url.trim_end_matches('/'), channel)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        let mut request = self.client.get(&self.url);
        if let Some(key) = &self.read_api_key {
            request = request.query(&[("api_key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        Ok(response.json::<FeedSnapshot>().await?)
    }
}
