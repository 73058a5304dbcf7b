//! Storage for ledger metadata.
//!
//! Only [`BlockEntry`] records are stored; expiry timers are process-local
//! and are re-armed from the stored `expires_at` by `BlockLedger::recover`.
//!
//! The redb store uses a single `BLOCKS` table keyed by target identifier
//! with a JSON-encoded entry as the value.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use redb::{Database, ReadableTable, TableDefinition};

use super::entry::BlockEntry;
use crate::error::{RemedyError, Result};

pub trait BlockStore: Send + Sync {
    fn get(&self, target: &str) -> Result<Option<BlockEntry>>;

    /// Insert or replace the entry for `entry.target`.
    fn put(&self, entry: &BlockEntry) -> Result<()>;

    fn remove(&self, target: &str) -> Result<Option<BlockEntry>>;

    fn list(&self) -> Result<Vec<BlockEntry>>;
}

// ---------------------------------------------------------------------------
// MemoryBlockStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    entries: Mutex<HashMap<String, BlockEntry>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, BlockEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, target: &str) -> Result<Option<BlockEntry>> {
        Ok(self.lock().get(target).cloned())
    }

    fn put(&self, entry: &BlockEntry) -> Result<()> {
        self.lock().insert(entry.target.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, target: &str) -> Result<Option<BlockEntry>> {
        Ok(self.lock().remove(target))
    }

    fn list(&self) -> Result<Vec<BlockEntry>> {
        let mut entries: Vec<BlockEntry> = self.lock().values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// RedbBlockStore
// ---------------------------------------------------------------------------

const BLOCKS: TableDefinition<&str, &[u8]> = TableDefinition::new("blocks");

fn store_err(e: impl std::fmt::Display) -> RemedyError {
    RemedyError::Store(e.to_string())
}

pub struct RedbBlockStore {
    db: Database,
}

impl RedbBlockStore {
    /// Open or create the database at `path` and make sure the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(BLOCKS).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }
}

impl BlockStore for RedbBlockStore {
    fn get(&self, target: &str) -> Result<Option<BlockEntry>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(BLOCKS).map_err(store_err)?;
        match table.get(target).map_err(store_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn put(&self, entry: &BlockEntry) -> Result<()> {
        let value = serde_json::to_vec(entry)?;
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(BLOCKS).map_err(store_err)?;
            table
                .insert(entry.target.as_str(), value.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }

    fn remove(&self, target: &str) -> Result<Option<BlockEntry>> {
        let wt = self.db.begin_write().map_err(store_err)?;
        let removed = {
            let mut table = wt.open_table(BLOCKS).map_err(store_err)?;
            let old = table.remove(target).map_err(store_err)?;
            match old {
                Some(v) => Some(serde_json::from_slice::<BlockEntry>(v.value())?),
                None => None,
            }
        };
        wt.commit().map_err(store_err)?;
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<BlockEntry>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(BLOCKS).map_err(store_err)?;

        let mut entries = Vec::new();
        for item in table.iter().map_err(store_err)? {
            let (_, v) = item.map_err(store_err)?;
            entries.push(serde_json::from_slice::<BlockEntry>(v.value())?);
        }
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use chrono::{Duration as CDur, Utc};
    use tempfile::TempDir;

    fn entry(target: &str, rule_id: &str) -> BlockEntry {
        BlockEntry {
            target: target.into(),
            rule_id: rule_id.into(),
            created_at: Utc::now(),
            expires_at: Some(Utc::now() + CDur::minutes(1)),
            severity: Severity::Low,
        }
    }

    fn exercise(store: &dyn BlockStore) {
        assert!(store.get("203.0.113.1").unwrap().is_none());

        store.put(&entry("203.0.113.1", "r1")).unwrap();
        store.put(&entry("203.0.113.1", "r2")).unwrap();
        store.put(&entry("198.51.100.9", "r3")).unwrap();

        let current = store.get("203.0.113.1").unwrap().unwrap();
        assert_eq!(current.rule_id, "r2", "put replaces the previous entry");
        assert_eq!(store.list().unwrap().len(), 2);

        let removed = store.remove("203.0.113.1").unwrap().unwrap();
        assert_eq!(removed.rule_id, "r2");
        assert!(store.remove("203.0.113.1").unwrap().is_none());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn memory_store_replaces_and_removes() {
        exercise(&MemoryBlockStore::new());
    }

    #[test]
    fn redb_store_replaces_and_removes() {
        let dir = TempDir::new().unwrap();
        let store = RedbBlockStore::open(&dir.path().join("blocks.db")).unwrap();
        exercise(&store);
    }

    #[test]
    fn redb_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("blocks.db");
        {
            let store = RedbBlockStore::open(&path).unwrap();
            store.put(&entry("203.0.113.7", "r7")).unwrap();
        }
        let store = RedbBlockStore::open(&path).unwrap();
        let e = store.get("203.0.113.7").unwrap().unwrap();
        assert_eq!(e.rule_id, "r7");
    }
}
