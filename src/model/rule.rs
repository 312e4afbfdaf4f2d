//! Rule records and the hierarchical rule tree returned by extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const UNKNOWN_SECTION_TITLE: &str = "Unknown Title";
pub const UNKNOWN_SUBSECTION_TITLE: &str = "Unknown Subsection Title";
pub const MISSING_RULE_TEXT: &str = "No Rule";

/// A single numbered guideline extracted from a source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rule {
    /// Sequential rule number, unique within one extraction run
    pub id: String,
    pub content: String,
    pub section: String,
    pub subsection: String,
    #[serde(rename = "DocumentName")]
    pub source_document: String,
    pub updated_at: DateTime<Utc>,
}

/// Rule hierarchy as produced by the model: sections, subsections, guidelines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTree {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: Option<String>,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subsection {
    pub title: Option<String>,
    pub guidelines: Vec<Guideline>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Guideline {
    pub rule: Option<String>,
}

impl RuleTree {
    /// Build a tree from loosely typed model output
    ///
    /// Returns `None` only when there is no `sections` array. Below that,
    /// scalar titles and rules are stringified, and missing or off-type
    /// children are treated as empty, so one bad field never drops the
    /// rest of the document.
    pub fn from_value(value: &Value) -> Option<Self> {
        let sections = value.get("sections")?.as_array()?;
        Some(Self {
            sections: sections.iter().map(Section::from_value).collect(),
        })
    }

    /// Total number of guidelines across all sections
    pub fn guideline_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.subsections)
            .map(|ss| ss.guidelines.len())
            .sum()
    }
}

impl Section {
    fn from_value(value: &Value) -> Self {
        Self {
            title: scalar_text(value.get("title")),
            subsections: children(value, "subsections")
                .map(Subsection::from_value)
                .collect(),
        }
    }
}

impl Subsection {
    fn from_value(value: &Value) -> Self {
        Self {
            title: scalar_text(value.get("title")),
            guidelines: children(value, "guidelines")
                .map(Guideline::from_value)
                .collect(),
        }
    }
}

impl Guideline {
    fn from_value(value: &Value) -> Self {
        Self {
            rule: scalar_text(value.get("rule")),
        }
    }
}

/// Elements of `value[key]` when it is an array, otherwise nothing
fn children<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Strings as-is, numbers and booleans as their JSON text
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
