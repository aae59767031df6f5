//! Append-only cost log store.
//!
//! Records are keyed by `Timestamp`. The Cost Logger only ever puts, the
//! Log Reader only ever scans; nothing updates or deletes.

mod dynamodb;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use dynamodb::{AttributeValue, DynamoDbStore, Item};
pub use memory::InMemoryStore;

/// One logged cost sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostRecord {
    /// Naive ISO-8601 datetime; the primary key.
    pub timestamp: String,
    /// Decimal amount as a string. Always set on write; may be missing on
    /// items written by other tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

impl CostRecord {
    #[must_use]
    pub fn new(timestamp: impl Into<String>, cost: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            cost: Some(cost.into()),
        }
    }
}

/// Key-indexed persistence for cost records.
#[async_trait]
pub trait CostStore: Send + Sync {
    /// Write a record, replacing any record with the same timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service rejects the write.
    async fn put(&self, record: &CostRecord) -> Result<()>;

    /// Read at most `limit` records in store order. No recency ordering.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or an item is malformed.
    async fn scan(&self, limit: usize) -> Result<Vec<CostRecord>>;
}
