//! Storage seams: rule store, result store and object store
//!
//! Services depend on these traits only; concrete backends are chosen in
//! `AppState` (PostgreSQL, in-memory, file-backed objects).

mod memory;
mod object;

use async_trait::async_trait;

use crate::db::DbError;
use crate::model::{ClaimResultRecord, Rule};

#[cfg(test)]
pub use memory::MemoryObjectStore;
pub use memory::{MemoryResultStore, MemoryRuleStore};
pub use object::FsObjectStore;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Object store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A row as returned by a full rule-table scan; any column may be absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRecord {
    pub rule_number: Option<String>,
    pub rule_content: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub document_name: Option<String>,
    pub update_datetime: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        Self {
            rule_number: Some(rule.id.clone()),
            rule_content: Some(rule.content.clone()),
            section: Some(rule.section.clone()),
            subsection: Some(rule.subsection.clone()),
            document_name: Some(rule.source_document.clone()),
            update_datetime: Some(rule.updated_at),
        }
    }
}

/// Table of extracted rules keyed by rule number
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Insert or overwrite one rule
    async fn put_rule(&self, rule: &Rule) -> Result<(), StoreError>;

    /// Unfiltered scan of every stored row
    async fn scan(&self) -> Result<Vec<RuleRecord>, StoreError>;

    /// Cheap reachability check that reads no rows
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Table of prediction results keyed by claim ID
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert or overwrite the record for `record.claim_id`
    async fn put(&self, record: &ClaimResultRecord) -> Result<(), StoreError>;

    async fn get(&self, claim_id: &str) -> Result<Option<ClaimResultRecord>, StoreError>;
}

/// Read-only blob storage holding prompt templates and source documents
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object's raw bytes
    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Read an object as UTF-8 text
    async fn get_text(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        let bytes = self.get_bytes(bucket, key).await?;
        String::from_utf8(bytes).map_err(|e| {
            StoreError::Serialization(format!("{bucket}/{key} is not UTF-8 text: {e}"))
        })
    }
}
