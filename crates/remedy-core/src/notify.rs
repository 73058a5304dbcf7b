use async_trait::async_trait;

use crate::error::Result;

/// Chat/alert channel. Implementations fail with `NotConfigured` when the
/// channel has no destination rather than dropping the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Writes notifications to the log instead of a chat channel.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        tracing::warn!(notification = text, "remediation alert");
        Ok(())
    }
}
