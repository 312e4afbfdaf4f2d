//! Read access to previously extracted rules

use std::sync::Arc;

use chrono::Utc;

use crate::model::Rule;
use crate::model::rule::{UNKNOWN_SECTION_TITLE, UNKNOWN_SUBSECTION_TITLE};
use crate::store::{RuleRecord, RuleStore, StoreError};

/// Loads the full rule set for prompt assembly
#[derive(Clone)]
pub struct RuleCatalog {
    store: Arc<dyn RuleStore>,
}

impl RuleCatalog {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Scan every stored rule, dropping rows without a number, content or source document
    pub async fn load_all_rules(&self) -> Result<Vec<Rule>, StoreError> {
        let records = self.store.scan().await?;
        let total = records.len();

        let rules: Vec<Rule> = records.into_iter().filter_map(into_rule).collect();
        if rules.len() < total {
            tracing::debug!(
                scanned = total,
                dropped = total - rules.len(),
                "Dropped incomplete rule rows"
            );
        }

        Ok(rules)
    }

    /// Whether the underlying store is reachable
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

fn into_rule(record: RuleRecord) -> Option<Rule> {
    Some(Rule {
        id: record.rule_number?,
        content: record.rule_content?,
        source_document: record.document_name?,
        section: record
            .section
            .unwrap_or_else(|| UNKNOWN_SECTION_TITLE.to_string()),
        subsection: record
            .subsection
            .unwrap_or_else(|| UNKNOWN_SUBSECTION_TITLE.to_string()),
        updated_at: record.update_datetime.unwrap_or_else(Utc::now),
    })
}

/// Rule texts in input order
pub fn project_contents(rules: &[Rule]) -> Vec<String> {
    rules.iter().map(|r| r.content.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRuleStore;

    fn record(number: Option<&str>, content: Option<&str>, doc: Option<&str>) -> RuleRecord {
        RuleRecord {
            rule_number: number.map(String::from),
            rule_content: content.map(String::from),
            document_name: doc.map(String::from),
            ..RuleRecord::default()
        }
    }

    #[tokio::test]
    async fn test_load_drops_incomplete_rows() {
        let store = Arc::new(MemoryRuleStore::new());
        store.insert_raw("1", record(Some("1"), Some("r1"), Some("d"))).await;
        store.insert_raw("2", record(Some("2"), None, Some("d"))).await;
        store.insert_raw("3", record(Some("3"), Some("r3"), None)).await;
        store.insert_raw("4", record(None, Some("r4"), Some("d"))).await;
        store.insert_raw("5", record(Some("5"), Some("r5"), Some("d"))).await;

        let rules = RuleCatalog::new(store).load_all_rules().await.unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(rules[0].section, "Unknown Title");
    }

    #[tokio::test]
    async fn test_load_round_trips_stored_rules() {
        let store = Arc::new(MemoryRuleStore::new());
        let now = Utc::now();
        let rule = Rule {
            id: "1".to_string(),
            content: "Deny if fraud".to_string(),
            section: "Fraud".to_string(),
            subsection: "Evidence".to_string(),
            source_document: "policy.pdf".to_string(),
            updated_at: now,
        };
        store.put_rule(&rule).await.unwrap();

        let rules = RuleCatalog::new(store).load_all_rules().await.unwrap();
        assert_eq!(rules, vec![rule]);
    }

    #[test]
    fn test_project_contents_preserves_order() {
        let now = Utc::now();
        let rules: Vec<Rule> = ["b", "a", "c"]
            .iter()
            .enumerate()
            .map(|(i, c)| Rule {
                id: (i + 1).to_string(),
                content: c.to_string(),
                section: String::new(),
                subsection: String::new(),
                source_document: "d".to_string(),
                updated_at: now,
            })
            .collect();
        assert_eq!(project_contents(&rules), vec!["b", "a", "c"]);
    }
}
