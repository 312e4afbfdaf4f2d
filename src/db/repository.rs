//! PostgreSQL-backed rule and result stores

use async_trait::async_trait;
use sqlx::PgPool;

use super::DbError;
use super::models::{ClaimResultRow, RuleRow};
use crate::model::{ClaimResultRecord, Rule};
use crate::store::{ResultStore, RuleRecord, RuleStore, StoreError};

/// Repository for the rule table
#[derive(Clone)]
pub struct RuleRepository {
    pool: PgPool,
    table: String,
}

impl RuleRepository {
    /// `table` must be a validated SQL identifier
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl RuleStore for RuleRepository {
    async fn put_rule(&self, rule: &Rule) -> Result<(), StoreError> {
        let query = format!(
            r#"
            INSERT INTO {} (
                rule_number, rule_content, section, subsection, document_name, update_datetime
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (rule_number) DO UPDATE SET
                rule_content = EXCLUDED.rule_content,
                section = EXCLUDED.section,
                subsection = EXCLUDED.subsection,
                document_name = EXCLUDED.document_name,
                update_datetime = EXCLUDED.update_datetime
            "#,
            self.table
        );

        sqlx::query(&query)
            .bind(&rule.id)
            .bind(&rule.content)
            .bind(&rule.section)
            .bind(&rule.subsection)
            .bind(&rule.source_document)
            .bind(rule.updated_at)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        tracing::debug!(rule_number = %rule.id, "Upserted rule");
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<RuleRecord>, StoreError> {
        // Full scan in rule-number order; fine while the rule set stays small
        let query = format!(
            r#"
            SELECT rule_number, rule_content, section, subsection, document_name, update_datetime
            FROM {}
            ORDER BY
                CASE WHEN rule_number ~ '^[0-9]{{1,18}}$' THEN rule_number::BIGINT END NULLS LAST,
                rule_number
            "#,
            self.table
        );

        let rows: Vec<RuleRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(rows.into_iter().map(RuleRecord::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}

/// Repository for the claim result table
#[derive(Clone)]
pub struct ClaimResultRepository {
    pool: PgPool,
    table: String,
    key_column: String,
}

impl ClaimResultRepository {
    /// `table` and `key_column` must be validated SQL identifiers
    pub fn new(pool: PgPool, table: impl Into<String>, key_column: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            key_column: key_column.into(),
        }
    }
}

#[async_trait]
impl ResultStore for ClaimResultRepository {
    async fn put(&self, record: &ClaimResultRecord) -> Result<(), StoreError> {
        let item = serde_json::to_value(record)
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        let query = format!(
            r#"
            INSERT INTO {table} ({key}, item, updated_at) VALUES ($1, $2, NOW())
            ON CONFLICT ({key}) DO UPDATE SET
                item = EXCLUDED.item,
                updated_at = EXCLUDED.updated_at
            "#,
            table = self.table,
            key = self.key_column
        );

        sqlx::query(&query)
            .bind(&record.claim_id)
            .bind(&item)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        tracing::debug!(claim_id = %record.claim_id, "Upserted claim result");
        Ok(())
    }

    async fn get(&self, claim_id: &str) -> Result<Option<ClaimResultRecord>, StoreError> {
        let query = format!(
            "SELECT item FROM {} WHERE {} = $1",
            self.table, self.key_column
        );

        let row: Option<ClaimResultRow> = sqlx::query_as(&query)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        row.map(|r| {
            serde_json::from_value(r.item).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()
    }
}
