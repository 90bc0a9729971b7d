//! Hand-off of evaluation results to whatever delivers them.
//!
//! Choosing recipients per tier and retrying unreachable ones belongs to the
//! delivery side. The engine's job ends once a result is handed over here.

use async_trait::async_trait;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use crate::alarm::Tier;
use crate::engine::EvaluationResult;
use crate::tracing::prelude::*;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a non-empty result. Failures are the notifier's to log.
    async fn deliver(&self, result: &EvaluationResult);
}

/// Writes every line to the log. Useful on its own for dry runs.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, result: &EvaluationResult) {
        for tier in Tier::iter() {
            for line in result.tier(tier) {
                warn!(tier = %tier, "Alarm: {line}");
            }
        }
        if let Some(message) = &result.stale_feed {
            error!(tier = %Tier::Admin, "{message}");
        }
    }
}

/// Forwards results to an in-process consumer.
#[async_trait]
impl Notifier for mpsc::Sender<EvaluationResult> {
    async fn deliver(&self, result: &EvaluationResult) {
        if self.send(result.clone()).await.is_err() {
            debug!("Notification channel closed");
        }
    }
}
