use std::sync::Arc;

use remedy_core::approval::ApprovalGate;
use remedy_core::config::{Config, StoreConfig};
use remedy_core::ledger::{BlockLedger, BlockStore, MemoryBlockStore, RedbBlockStore};
use remedy_core::Orchestrator;

use crate::backends;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Wire collaborators and the ledger store named in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn BlockStore> = match &config.store {
            StoreConfig::Memory => Arc::new(MemoryBlockStore::new()),
            StoreConfig::Redb { path } => Arc::new(RedbBlockStore::open(path)?),
        };
        let ledger = BlockLedger::new(
            backends::enforcement(&config.enforcement)?,
            store,
            config.block.ledger_settings(),
        );
        let gate = ApprovalGate::new(
            backends::ticketing(&config.ticketing)?,
            config.ticketing.issue_type(),
            config.ticketing.labels(),
        );
        let notifier = backends::notifier(&config.notifications);
        Ok(Self::new(Orchestrator::new(ledger, gate, notifier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_builds_dry_run_state() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert_eq!(state.orchestrator.ledger().live_timers(), 0);
    }

    #[test]
    fn redb_store_is_created_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("blocks.db");
        let config = Config {
            store: StoreConfig::Redb { path: path.clone() },
            ..Config::default()
        };
        AppState::from_config(&config).unwrap();
        assert!(path.exists());
    }
}
