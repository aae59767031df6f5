//! In-process store used by tests and local runs.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{CostRecord, CostStore};
use crate::error::Result;

/// A thread-safe in-memory cost store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<BTreeMap<String, CostRecord>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = CostRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.timestamp.clone(), r))
            .collect();
        Self {
            records: Arc::new(RwLock::new(map)),
        }
    }

    /// Snapshot of every stored record.
    #[must_use]
    pub fn records(&self) -> Vec<CostRecord> {
        self.records
            .read()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, timestamp: &str) -> bool {
        self.records
            .read()
            .map(|r| r.contains_key(timestamp))
            .unwrap_or(false)
    }
}

#[async_trait]
impl CostStore for InMemoryStore {
    async fn put(&self, record: &CostRecord) -> Result<()> {
        if let Ok(mut records) = self.records.write() {
            records.insert(record.timestamp.clone(), record.clone());
        }
        Ok(())
    }

    async fn scan(&self, limit: usize) -> Result<Vec<CostRecord>> {
        Ok(self
            .records
            .read()
            .map(|r| r.values().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
