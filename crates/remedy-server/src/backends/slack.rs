use async_trait::async_trait;
use remedy_core::notify::Notifier;
use remedy_core::{RemedyError, Result};

/// Slack incoming-webhook notifier. Without a URL every send fails with
/// `NotConfigured`.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let Some(url) = self.webhook_url.as_deref() else {
            return Err(RemedyError::NotConfigured(
                "slack webhook URL is not set".to_string(),
            ));
        };
        let resp = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| RemedyError::Notification(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemedyError::Notification(format!("{status}: {body}")));
        }
        Ok(())
    }
}
