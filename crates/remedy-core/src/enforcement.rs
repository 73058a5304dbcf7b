//! Boundary to the network access-control service that installs and removes
//! block rules. The service, not this process, is the source of truth for
//! which targets are currently blocked.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::{RemedyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    Block,
    Challenge,
    JsChallenge,
    ManagedChallenge,
    Whitelist,
    #[serde(other)]
    Other,
}

/// A rule currently present on the enforcement backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRule {
    pub id: String,
    pub mode: RuleMode,
    pub target: String,
}

#[async_trait]
pub trait EnforcementBackend: Send + Sync {
    /// Install a block for `target`; returns the backend's rule id.
    async fn install_block(&self, target: &str, note: &str) -> Result<String>;

    async fn remove_block(&self, rule_id: &str) -> Result<()>;

    async fn list_rules(&self) -> Result<Vec<ActiveRule>>;
}

// ---------------------------------------------------------------------------
// DryRunEnforcement
// ---------------------------------------------------------------------------

/// In-process rule set. Used when no enforcement account is configured.
#[derive(Debug, Default)]
pub struct DryRunEnforcement {
    rules: Mutex<Vec<ActiveRule>>,
}

impl DryRunEnforcement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the installed rules.
    pub fn rules(&self) -> Vec<ActiveRule> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ActiveRule>> {
        self.rules.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl EnforcementBackend for DryRunEnforcement {
    async fn install_block(&self, target: &str, note: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        tracing::info!(ip = target, rule_id = %id, note, "dry-run: block installed");
        self.lock().push(ActiveRule {
            id: id.clone(),
            mode: RuleMode::Block,
            target: target.to_string(),
        });
        Ok(id)
    }

    async fn remove_block(&self, rule_id: &str) -> Result<()> {
        let mut rules = self.lock();
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        if rules.len() == before {
            return Err(RemedyError::Enforcement(format!("rule not found: {rule_id}")));
        }
        tracing::info!(rule_id, "dry-run: block removed");
        Ok(())
    }

    async fn list_rules(&self) -> Result<Vec<ActiveRule>> {
        Ok(self.rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_list_remove() {
        let backend = DryRunEnforcement::new();
        let id = backend.install_block("203.0.113.1", "test").await.unwrap();

        let rules = backend.list_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].target, "203.0.113.1");
        assert_eq!(rules[0].mode, RuleMode::Block);

        backend.remove_block(&id).await.unwrap();
        assert!(backend.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_unknown_rule_fails() {
        let backend = DryRunEnforcement::new();
        let err = backend.remove_block("nope").await.unwrap_err();
        assert!(matches!(err, RemedyError::Enforcement(_)));
    }

    #[test]
    fn unknown_mode_deserializes_as_other() {
        let mode: RuleMode = serde_json::from_str("\"bypass\"").unwrap();
        assert_eq!(mode, RuleMode::Other);
    }
}
