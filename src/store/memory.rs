//! In-memory store backends

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

#[cfg(test)]
use super::ObjectStore;
use super::{ResultStore, RuleRecord, RuleStore, StoreError};
use crate::model::{ClaimResultRecord, Rule};

#[derive(Default)]
pub struct MemoryRuleStore {
    rows: RwLock<BTreeMap<String, RuleRecord>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw row as-is, bypassing rule construction
    #[cfg(test)]
    pub async fn insert_raw(&self, key: &str, record: RuleRecord) {
        self.rows.write().await.insert(key.to_string(), record);
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn put_rule(&self, rule: &Rule) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .insert(rule.id.clone(), RuleRecord::from(rule));
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<RuleRecord>, StoreError> {
        let rows = self.rows.read().await;
        let mut keys: Vec<&String> = rows.keys().collect();
        keys.sort_by_key(|k| rule_order(k));
        Ok(keys.into_iter().map(|k| rows[k].clone()).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Numeric rule numbers in numeric order, anything else after them.
/// Same rule as the Postgres scan: only 1 to 18 ASCII digits count as numeric.
fn rule_order(key: &str) -> (bool, u64, &str) {
    let numeric = (1..=18).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_digit());
    match key.parse::<u64>() {
        Ok(n) if numeric => (false, n, key),
        _ => (true, 0, key),
    }
}

#[derive(Default)]
pub struct MemoryResultStore {
    records: RwLock<HashMap<String, ClaimResultRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, record: &ClaimResultRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.claim_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, claim_id: &str) -> Result<Option<ClaimResultRecord>, StoreError> {
        Ok(self.records.read().await.get(claim_id).cloned())
    }
}

/// Object store used by tests in place of files on disk
#[cfg(test)]
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

#[cfg(test)]
impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_text(&self, bucket: &str, key: &str, text: impl Into<String>) {
        self.put_bytes(bucket, key, text.into().into_bytes()).await;
    }

    pub async fn put_bytes(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);
    }
}

#[cfg(test)]
#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
