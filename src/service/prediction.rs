//! Prediction invocation and reply parsing
//!
//! The model answers in free text with two tagged sections:
//! `<prediction>...</prediction>` and `<rules_used>[...]</rules_used>`.
//! Each section parses to an explicit outcome so callers can tell a tag the
//! model legitimately omitted from one it mangled.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::service::llm::{LanguageModel, ModelError};
use crate::service::repair::repair_json;

/// Total attempts for a model call when the transport times out
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of looking for one tagged section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tagged {
    Found(String),
    Absent,
    /// Opening tag present but never closed
    Unterminated,
}

/// Rule identifiers the model reports having applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesUsed {
    Listed(Vec<String>),
    Absent,
    Malformed { raw: String, reason: String },
}

impl RulesUsed {
    /// Identifiers, or an empty list when absent or malformed
    pub fn ids(&self) -> Vec<String> {
        match self {
            RulesUsed::Listed(ids) => ids.clone(),
            RulesUsed::Absent | RulesUsed::Malformed { .. } => Vec::new(),
        }
    }
}

/// Parsed model reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVerdict {
    pub prediction: Tagged,
    pub rules_used: RulesUsed,
}

impl ModelVerdict {
    pub fn prediction_text(&self) -> Option<String> {
        match &self.prediction {
            Tagged::Found(text) => Some(text.clone()),
            Tagged::Absent | Tagged::Unterminated => None,
        }
    }
}

/// Extracts tagged sections from free-text model replies
pub struct ReplyParser {
    prediction_pattern: Regex,
    rules_used_pattern: Regex,
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyParser {
    pub fn new() -> Self {
        Self {
            prediction_pattern: Regex::new(r"(?s)<prediction>(.*?)</prediction>")
                .expect("static pattern"),
            rules_used_pattern: Regex::new(r"(?s)<rules_used>(.*?)</rules_used>")
                .expect("static pattern"),
        }
    }

    pub fn parse(&self, reply: &str) -> ModelVerdict {
        let prediction = find_tag(&self.prediction_pattern, reply, "<prediction>");

        let rules_used = match find_tag(&self.rules_used_pattern, reply, "<rules_used>") {
            Tagged::Found(raw) => parse_rule_ids(&raw),
            Tagged::Absent => RulesUsed::Absent,
            Tagged::Unterminated => RulesUsed::Malformed {
                raw: String::new(),
                reason: "unterminated <rules_used> tag".to_string(),
            },
        };

        ModelVerdict {
            prediction,
            rules_used,
        }
    }
}

fn find_tag(pattern: &Regex, text: &str, open_tag: &str) -> Tagged {
    match pattern.captures(text).and_then(|c| c.get(1)) {
        Some(m) => Tagged::Found(m.as_str().to_string()),
        None if text.contains(open_tag) => Tagged::Unterminated,
        None => Tagged::Absent,
    }
}

/// Repair and parse a JSON array of rule identifiers
///
/// Numeric identifiers are converted to strings; any other element kind is dropped.
fn parse_rule_ids(raw: &str) -> RulesUsed {
    let malformed = |reason: String| RulesUsed::Malformed {
        raw: raw.to_string(),
        reason,
    };

    match repair_json(raw) {
        Ok(Value::Array(items)) => RulesUsed::Listed(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Ok(other) => malformed(format!("expected an array, got {other}")),
        Err(e) => malformed(e.to_string()),
    }
}

/// Sends assembled prompts to the model and parses the verdict
pub struct PredictionInvoker {
    model: Arc<dyn LanguageModel>,
    parser: ReplyParser,
}

impl PredictionInvoker {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            parser: ReplyParser::new(),
        }
    }

    /// Invoke the model with bounded retry on timeout, then parse the reply
    pub async fn predict(&self, prompt: &str) -> Result<ModelVerdict, ModelError> {
        let reply = self.invoke_with_retry(prompt).await?;
        let verdict = self.parser.parse(&reply);

        if verdict.prediction == Tagged::Unterminated {
            tracing::warn!("Model reply has an unterminated <prediction> tag");
        }
        match &verdict.rules_used {
            RulesUsed::Malformed { raw, reason } => {
                tracing::error!(raw = %raw, reason = %reason, "Error parsing rules_used");
            }
            RulesUsed::Absent => tracing::debug!("Model reply has no <rules_used> tag"),
            RulesUsed::Listed(ids) => {
                tracing::info!(rules_used = ?ids, "Extracted rules_used");
            }
        }

        Ok(verdict)
    }

    /// Up to [`MAX_ATTEMPTS`] attempts, retrying only transient failures, with no delay
    async fn invoke_with_retry(&self, prompt: &str) -> Result<String, ModelError> {
        let mut attempt = 1;
        loop {
            match self.model.invoke(prompt).await {
                Ok(reply) => {
                    if attempt > 1 {
                        tracing::info!(attempt = attempt, "Model invocation succeeded after retry");
                    }
                    return Ok(reply);
                }
                Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %e,
                        "Read timeout invoking model, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::llm::testing::ScriptedModel;

    fn timeout() -> Result<String, ModelError> {
        Err(ModelError::Timeout("read timed out".to_string()))
    }

    #[test]
    fn test_extracts_prediction_and_rules() {
        let verdict = ReplyParser::new().parse(
            r#"The answer is <prediction>Approved</prediction> based on <rules_used>["1","4"]</rules_used>"#,
        );
        assert_eq!(verdict.prediction_text().as_deref(), Some("Approved"));
        assert_eq!(verdict.rules_used.ids(), vec!["1", "4"]);
    }

    #[test]
    fn test_missing_prediction_tag_yields_none() {
        let verdict = ReplyParser::new().parse("I cannot decide. <rules_used>[]</rules_used>");
        assert_eq!(verdict.prediction, Tagged::Absent);
        assert_eq!(verdict.prediction_text(), None);
        assert_eq!(verdict.rules_used, RulesUsed::Listed(vec![]));
    }

    #[test]
    fn test_prediction_spans_newlines_and_is_non_greedy() {
        let verdict = ReplyParser::new()
            .parse("<prediction>\nDenied\n</prediction> and <prediction>Second</prediction>");
        assert_eq!(verdict.prediction, Tagged::Found("\nDenied\n".to_string()));
    }

    #[test]
    fn test_unterminated_tags_are_distinguished() {
        let verdict = ReplyParser::new().parse("<prediction>Approved <rules_used>[\"1\"]");
        assert_eq!(verdict.prediction, Tagged::Unterminated);
        assert!(matches!(verdict.rules_used, RulesUsed::Malformed { .. }));
        assert_eq!(verdict.prediction_text(), None);
        assert!(verdict.rules_used.ids().is_empty());
    }

    #[test]
    fn test_trailing_comma_in_rules_used_is_repaired() {
        let verdict = ReplyParser::new().parse(r#"<rules_used>["1","4",]</rules_used>"#);
        assert_eq!(verdict.rules_used, RulesUsed::Listed(vec!["1".into(), "4".into()]));
    }

    #[test]
    fn test_irreparable_rules_used_yields_empty() {
        let verdict = ReplyParser::new().parse("<rules_used>rules one and four</rules_used>");
        assert!(matches!(verdict.rules_used, RulesUsed::Malformed { .. }));
        assert!(verdict.rules_used.ids().is_empty());
    }

    #[test]
    fn test_rules_used_object_is_malformed() {
        let verdict = ReplyParser::new().parse(r#"<rules_used>{"ids": ["1"]}</rules_used>"#);
        assert!(matches!(verdict.rules_used, RulesUsed::Malformed { .. }));
    }

    #[test]
    fn test_numeric_rule_ids_are_stringified() {
        let verdict = ReplyParser::new().parse("<rules_used>[1, 4, null, \"7\"]</rules_used>");
        assert_eq!(verdict.rules_used.ids(), vec!["1", "4", "7"]);
    }

    #[test]
    fn test_deeply_nested_rules_used_is_malformed() {
        let reply = format!("<prediction>Denied</prediction><rules_used>{}</rules_used>", "[".repeat(100_000));
        let verdict = ReplyParser::new().parse(&reply);
        assert_eq!(verdict.prediction_text().as_deref(), Some("Denied"));
        assert!(matches!(verdict.rules_used, RulesUsed::Malformed { .. }));
        assert!(verdict.rules_used.ids().is_empty());
    }

    #[test]
    fn test_absent_rules_used_tag() {
        let verdict = ReplyParser::new().parse("<prediction>Approved</prediction>");
        assert_eq!(verdict.rules_used, RulesUsed::Absent);
        assert!(verdict.rules_used.ids().is_empty());
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt_after_timeouts() {
        let model = Arc::new(ScriptedModel::new(vec![
            timeout(),
            timeout(),
            Ok("<prediction>Approved</prediction>".to_string()),
        ]));
        let invoker = PredictionInvoker::new(model.clone());

        let verdict = invoker.predict("prompt").await.unwrap();
        assert_eq!(verdict.prediction_text().as_deref(), Some("Approved"));
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_propagate_last_timeout() {
        let model = Arc::new(ScriptedModel::new(vec![
            timeout(),
            timeout(),
            timeout(),
            Ok("never reached".to_string()),
        ]));
        let invoker = PredictionInvoker::new(model.clone());

        let err = invoker.predict("prompt").await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout(_)));
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::Status {
                status: 403,
                body: "denied".to_string(),
            }),
            Ok("unused".to_string()),
        ]));
        let invoker = PredictionInvoker::new(model.clone());

        let err = invoker.predict("prompt").await.unwrap_err();
        assert!(matches!(err, ModelError::Status { status: 403, .. }));
        assert_eq!(model.calls(), 1);
    }
}
