use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::severity::Severity;

/// Ledger record for one blocked target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub target: String,
    /// Rule handle issued by the enforcement backend.
    pub rule_id: String,
    pub created_at: DateTime<Utc>,
    /// `None` for permanent blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub severity: Severity,
}

impl BlockEntry {
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    /// Time left before expiry as of `now`, clamped at zero. `None` for
    /// permanent blocks.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|at| (at - now).to_std().unwrap_or(Duration::ZERO))
    }
}
