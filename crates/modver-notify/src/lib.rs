//! Fire-and-forget status notifications.
//!
//! Every verification run reports its outcome as a human-readable line.
//! Delivery is best-effort by contract: a failing notifier must never abort
//! the pipeline, so implementations swallow their own errors.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

/// One-way delivery of human-readable status strings.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text`. Errors are handled (and at most logged) internally.
    async fn notify(&self, text: &str);
}

/// Notifier that only writes to the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, text: &str) {
        info!(target: "modver::notify", "{text}");
    }
}

/// Notifier that posts each message to a webhook as JSON.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) {
        let body = serde_json::json!({ "text": text });
        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(status = %response.status(), "notification delivery rejected");
            }
            Err(err) => {
                warn!(%err, "notification delivery failed");
            }
        }
    }
}

/// Notifier capturing messages in memory, for tests.
#[derive(Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_notifier_captures_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify("first").await;
        notifier.notify("second").await;
        assert_eq!(notifier.messages(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn webhook_failure_does_not_panic() {
        // Unroutable port: delivery fails, notify still returns.
        let notifier =
            WebhookNotifier::new(reqwest::Client::new(), "http://127.0.0.1:1/hook");
        notifier.notify("status line").await;
    }
}
