//! Temporary block ledger.
//!
//! Owns the mapping from blocked target to expiry metadata and the timer that
//! lifts a temporary block. Every mutation for a target runs under that
//! target's lock, so at most one entry and one armed timer exist per target.
//! Different targets never contend.
//!
//! The enforcement backend is the authority on which targets are blocked;
//! the ledger only tracks what it must lift automatically.

pub mod entry;
pub mod store;

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;

use crate::enforcement::{EnforcementBackend, RuleMode};
use crate::error::{RemedyError, Result};
use crate::severity::{block_duration, Severity};

pub use entry::BlockEntry;
pub use store::{BlockStore, MemoryBlockStore, RedbBlockStore};

// ---------------------------------------------------------------------------
// Settings and outcomes
// ---------------------------------------------------------------------------

/// Whether a block without a finite duration is installed automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPolicy {
    /// Every block request installs a rule.
    #[default]
    Always,
    /// Permanent blocks need `explicit_block`; otherwise the request is skipped.
    ExplicitOrTemporary,
}

#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// One severity unit; low blocks last one unit, medium two.
    pub ttl_unit: Duration,
    pub policy: BlockPolicy,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            ttl_unit: Duration::from_secs(60),
            policy: BlockPolicy::Always,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Temporary {
        rule_id: String,
        unblock_at: DateTime<Utc>,
    },
    Permanent {
        rule_id: String,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnblockOutcome {
    Removed { rule_id: String },
    NotFound,
}

// ---------------------------------------------------------------------------
// Per-target locks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TargetLocks {
    map: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TargetLocks {
    async fn lock(&self, target: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.map.lock().unwrap_or_else(|p| p.into_inner());
            // A count of one means only the map holds it: nobody owns or waits.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            map.entry(target.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

struct ExpiryTimer {
    rule_id: String,
    handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// BlockLedger
// ---------------------------------------------------------------------------

struct Inner {
    backend: Arc<dyn EnforcementBackend>,
    store: Arc<dyn BlockStore>,
    settings: LedgerSettings,
    locks: TargetLocks,
    timers: Mutex<HashMap<String, ExpiryTimer>>,
}

/// Cheap to clone; clones share the same entries and timers.
#[derive(Clone)]
pub struct BlockLedger {
    inner: Arc<Inner>,
}

impl BlockLedger {
    pub fn new(
        backend: Arc<dyn EnforcementBackend>,
        store: Arc<dyn BlockStore>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                settings,
                locks: TargetLocks::default(),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.inner.settings
    }

    /// Block `target`, replacing any live entry and its timer.
    pub async fn block(
        &self,
        target: &str,
        severity: Severity,
        explicit: bool,
        note: &str,
    ) -> Result<BlockOutcome> {
        let duration = block_duration(severity, self.inner.settings.ttl_unit);
        if duration.is_none()
            && !explicit
            && self.inner.settings.policy == BlockPolicy::ExplicitOrTemporary
        {
            tracing::info!(ip = target, %severity, "permanent block skipped without explicit flag");
            return Ok(BlockOutcome::Skipped {
                reason: format!(
                    "severity '{severity}' implies a permanent block; set explicit_block to install it"
                ),
            });
        }

        let _guard = self.inner.locks.lock(target).await;

        let now = Utc::now();
        let expires_at = match duration {
            Some(d) => Some(expiry_from(now, d)?),
            None => None,
        };
        let previous = self.inner.store.get(target)?;

        let rule_id = self.inner.backend.install_block(target, note).await?;

        let entry = BlockEntry {
            target: target.to_string(),
            rule_id: rule_id.clone(),
            created_at: now,
            expires_at,
            severity,
        };
        // The previous entry and its timer stay in force until the new one is recorded.
        if let Err(e) = self.inner.store.put(&entry) {
            if let Err(remove_err) = self.inner.backend.remove_block(&rule_id).await {
                tracing::warn!(ip = target, rule_id = %rule_id, error = %remove_err, "failed to remove untracked rule");
            }
            return Err(e);
        }
        self.cancel_timer(target);
        if let Some(d) = duration {
            self.arm(target, &rule_id, d);
        }

        if let Some(old) = previous.filter(|p| p.rule_id != rule_id) {
            tracing::debug!(ip = target, old_rule = %old.rule_id, new_rule = %rule_id, "superseding block");
            if let Err(e) = self.inner.backend.remove_block(&old.rule_id).await {
                tracing::warn!(ip = target, rule_id = %old.rule_id, error = %e, "failed to remove superseded rule");
            }
        }

        match expires_at {
            Some(unblock_at) => {
                tracing::info!(ip = target, rule_id = %rule_id, %severity, %unblock_at, "temporary block installed");
                Ok(BlockOutcome::Temporary {
                    rule_id,
                    unblock_at,
                })
            }
            None => {
                tracing::info!(ip = target, rule_id = %rule_id, %severity, "permanent block installed");
                Ok(BlockOutcome::Permanent { rule_id })
            }
        }
    }

    /// Remove the backend's active block for `target`, whether or not this
    /// process installed it.
    pub async fn unblock(&self, target: &str) -> Result<UnblockOutcome> {
        let _guard = self.inner.locks.lock(target).await;

        let matching: Vec<String> = self
            .inner
            .backend
            .list_rules()
            .await?
            .into_iter()
            .filter(|r| r.mode == RuleMode::Block && same_target(&r.target, target))
            .map(|r| r.id)
            .collect();
        let Some(first) = matching.first().cloned() else {
            if self.forget(target)? {
                tracing::debug!(ip = target, "dropped local entry with no remote rule");
            }
            return Ok(UnblockOutcome::NotFound);
        };

        // Leftovers from a failed supersede cleanup go too.
        for rule_id in &matching {
            self.inner.backend.remove_block(rule_id).await?;
            tracing::info!(ip = target, rule_id = %rule_id, "block removed");
        }
        self.forget(target)?;
        Ok(UnblockOutcome::Removed { rule_id: first })
    }

    /// Targets the backend currently blocks.
    pub async fn list_blocked(&self) -> Result<Vec<String>> {
        let rules = self.inner.backend.list_rules().await?;
        Ok(rules
            .into_iter()
            .filter(|r| r.mode == RuleMode::Block)
            .map(|r| r.target)
            .collect())
    }

    /// Re-arm timers for stored temporary blocks. Entries already past their
    /// expiry are lifted right away. Returns the number of timers armed.
    pub async fn recover(&self) -> Result<usize> {
        let entries = self.inner.store.list()?;
        let now = Utc::now();
        let mut armed = 0;
        for entry in entries {
            let Some(delay) = entry.remaining(now) else {
                continue;
            };
            let _guard = self.inner.locks.lock(&entry.target).await;
            self.arm(&entry.target, &entry.rule_id, delay);
            armed += 1;
        }
        if armed > 0 {
            tracing::info!(armed, "re-armed expiry timers from ledger store");
        }
        Ok(armed)
    }

    pub fn entry(&self, target: &str) -> Result<Option<BlockEntry>> {
        self.inner.store.get(target)
    }

    /// Number of expiry timers that have not yet fired.
    pub fn live_timers(&self) -> usize {
        self.timers()
            .values()
            .filter(|t| !t.handle.is_finished())
            .count()
    }

    pub fn has_timer(&self, target: &str) -> bool {
        self.timers()
            .get(target)
            .is_some_and(|t| !t.handle.is_finished())
    }

    // -- internals; callers hold the target lock ----------------------------

    fn timers(&self) -> std::sync::MutexGuard<'_, HashMap<String, ExpiryTimer>> {
        self.inner.timers.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn arm(&self, target: &str, rule_id: &str, delay: Duration) {
        let ledger = self.clone();
        let t = target.to_string();
        let r = rule_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            ledger.expire(&t, &r).await;
        });
        let previous = self.timers().insert(
            target.to_string(),
            ExpiryTimer {
                rule_id: rule_id.to_string(),
                handle,
            },
        );
        if let Some(old) = previous {
            old.handle.abort();
        }
    }

    fn cancel_timer(&self, target: &str) {
        if let Some(timer) = self.timers().remove(target) {
            timer.handle.abort();
            tracing::debug!(ip = target, rule_id = %timer.rule_id, "expiry timer cancelled");
        }
    }

    /// Cancel the timer and delete the entry together. Returns whether an
    /// entry existed.
    fn forget(&self, target: &str) -> Result<bool> {
        self.cancel_timer(target);
        Ok(self.inner.store.remove(target)?.is_some())
    }

    async fn expire(&self, target: &str, rule_id: &str) {
        let _guard = self.inner.locks.lock(target).await;

        let current = match self.inner.store.get(target) {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(ip = target, rule_id, error = %e, "expiry skipped: ledger store unreadable");
                return;
            }
        };
        if current.as_ref().map(|e| e.rule_id.as_str()) != Some(rule_id) {
            tracing::debug!(ip = target, rule_id, "expiry skipped: entry superseded or removed");
            return;
        }

        if let Err(e) = self.inner.backend.remove_block(rule_id).await {
            tracing::warn!(ip = target, rule_id, error = %e, "failed to lift expired block; dropping entry anyway");
        }
        if let Err(e) = self.inner.store.remove(target) {
            tracing::warn!(ip = target, rule_id, error = %e, "failed to delete expired ledger entry");
        }

        // Dropping our own handle detaches the task; it does not abort it.
        let mut timers = self.timers();
        if timers.get(target).is_some_and(|t| t.rule_id == rule_id) {
            timers.remove(target);
        }
        tracing::info!(ip = target, rule_id, "temporary block expired");
    }
}

/// Address targets compare by parsed value; backends may store a different spelling.
fn same_target(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

fn expiry_from(now: DateTime<Utc>, d: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(d)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| RemedyError::Store(format!("block duration out of range: {d:?}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
