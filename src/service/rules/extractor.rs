//! Rule extraction: document text to numbered rule records

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::document::document_text;
use super::error::RuleExtractionError;
use super::prompts::build_extraction_prompt;
use crate::model::rule::{MISSING_RULE_TEXT, UNKNOWN_SECTION_TITLE, UNKNOWN_SUBSECTION_TITLE};
use crate::model::{Rule, RuleTree};
use crate::service::llm::{LanguageModel, ModelError};
use crate::service::repair::repair_json;
use crate::store::{ObjectStore, RuleStore, StoreError};

/// Parsed rule tree, or why the model output could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum RuleTreeOutcome {
    Parsed(RuleTree),
    Malformed { reason: String },
}

impl RuleTreeOutcome {
    /// The parsed tree, or an empty tree when the output was malformed
    pub fn into_tree(self) -> RuleTree {
        match self {
            RuleTreeOutcome::Parsed(tree) => tree,
            RuleTreeOutcome::Malformed { .. } => RuleTree::default(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            RuleTreeOutcome::Parsed(_) => "parsed",
            RuleTreeOutcome::Malformed { .. } => "malformed",
        }
    }
}

/// Summary of one extraction run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExtractionReport {
    pub document_name: String,
    /// `parsed` or `malformed`
    pub tree_status: String,
    pub rules_extracted: usize,
    pub rules_written: usize,
    /// Set when the batch write stopped early
    pub write_error: Option<String>,
}

/// Parse a model reply into a rule tree, tolerating near-JSON
pub fn parse_rule_tree(reply: &str) -> RuleTreeOutcome {
    let value = match repair_json(reply) {
        Ok(value) => value,
        Err(e) => {
            return RuleTreeOutcome::Malformed {
                reason: e.to_string(),
            };
        }
    };

    match RuleTree::from_value(&value) {
        Some(tree) => RuleTreeOutcome::Parsed(tree),
        None => RuleTreeOutcome::Malformed {
            reason: "missing 'sections' array".to_string(),
        },
    }
}

/// Flatten a rule tree in source order, numbering rules from 1
///
/// Numbering restarts on every call and is not namespaced by document.
pub fn flatten(tree: &RuleTree, document_name: &str, updated_at: DateTime<Utc>) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(tree.guideline_count());
    let mut rule_number: u64 = 1;

    for section in &tree.sections {
        let section_title = section.title.as_deref().unwrap_or(UNKNOWN_SECTION_TITLE);
        for subsection in &section.subsections {
            let subsection_title = subsection
                .title
                .as_deref()
                .unwrap_or(UNKNOWN_SUBSECTION_TITLE);
            for guideline in &subsection.guidelines {
                rules.push(Rule {
                    id: rule_number.to_string(),
                    content: guideline
                        .rule
                        .clone()
                        .unwrap_or_else(|| MISSING_RULE_TEXT.to_string()),
                    section: section_title.to_string(),
                    subsection: subsection_title.to_string(),
                    source_document: document_name.to_string(),
                    updated_at,
                });
                rule_number += 1;
            }
        }
    }

    rules
}

/// Turns policy documents into stored rule records
pub struct RuleExtractor {
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn RuleStore>,
    documents: Arc<dyn ObjectStore>,
    bucket: String,
}

impl RuleExtractor {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn RuleStore>,
        documents: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            model,
            store,
            documents,
            bucket: bucket.into(),
        }
    }

    /// Ask the model for the rule hierarchy of `document_text`
    pub async fn extract(&self, document_text: &str) -> Result<RuleTreeOutcome, ModelError> {
        let prompt = build_extraction_prompt(document_text);
        let reply = self.model.invoke(&prompt).await?;

        let outcome = parse_rule_tree(&reply);
        if let RuleTreeOutcome::Malformed { ref reason } = outcome {
            tracing::error!(
                reason = %reason,
                reply_length = reply.len(),
                "Error extracting rules from model reply"
            );
        }
        Ok(outcome)
    }

    /// Write rules one by one; the first failure aborts the rest of the batch
    ///
    /// Returns how many rules were written before any failure.
    pub async fn save_rules(&self, rules: &[Rule]) -> (usize, Option<StoreError>) {
        for (written, rule) in rules.iter().enumerate() {
            if let Err(e) = self.store.put_rule(rule).await {
                tracing::error!(
                    rule_number = %rule.id,
                    written = written,
                    error = %e,
                    "Error saving rules to store"
                );
                return (written, Some(e));
            }
        }
        (rules.len(), None)
    }

    /// Read a document from the object store, then extract and store its rules
    ///
    /// `.pdf` keys go through PDF text extraction; anything else is read as UTF-8.
    pub async fn extract_stored_document(
        &self,
        document_name: &str,
    ) -> Result<ExtractionReport, RuleExtractionError> {
        let bytes = self
            .documents
            .get_bytes(&self.bucket, document_name)
            .await
            .map_err(RuleExtractionError::Document)?;
        let text = document_text(document_name, bytes).await?;
        self.extract_and_store(document_name, &text).await
    }

    /// Extract, flatten and store the rules of one document
    pub async fn extract_and_store(
        &self,
        document_name: &str,
        document_text: &str,
    ) -> Result<ExtractionReport, RuleExtractionError> {
        let outcome = self.extract(document_text).await?;
        let tree_status = outcome.status().to_string();

        let rules = flatten(&outcome.into_tree(), document_name, Utc::now());
        let (rules_written, write_error) = self.save_rules(&rules).await;

        tracing::info!(
            document = %document_name,
            tree_status = %tree_status,
            rules_extracted = rules.len(),
            rules_written = rules_written,
            "Rule extraction complete"
        );

        Ok(ExtractionReport {
            document_name: document_name.to_string(),
            tree_status,
            rules_extracted: rules.len(),
            rules_written,
            write_error: write_error.map(|e| e.to_string()),
        })
    }
}
