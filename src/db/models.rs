//! Database row models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::store::RuleRecord;

/// Database representation of a rule row
#[derive(Debug, Clone, FromRow)]
pub struct RuleRow {
    pub rule_number: Option<String>,
    pub rule_content: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub document_name: Option<String>,
    pub update_datetime: Option<DateTime<Utc>>,
}

impl From<RuleRow> for RuleRecord {
    fn from(row: RuleRow) -> Self {
        Self {
            rule_number: row.rule_number,
            rule_content: row.rule_content,
            section: row.section,
            subsection: row.subsection,
            document_name: row.document_name,
            update_datetime: row.update_datetime,
        }
    }
}

/// Database representation of a stored claim result
#[derive(Debug, Clone, FromRow)]
pub struct ClaimResultRow {
    pub item: serde_json::Value,
}
