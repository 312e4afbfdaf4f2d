//! Prompt assembly from a stored template
//!
//! Templates use named placeholders: `{Claim}`, `{Rules_contents}`,
//! `{R_number_content_list}`, plus indexed access such as `{Claim[ClaimID]}`.
//! Literal braces are written `{{` and `}}`. Strings are substituted raw;
//! lists and objects are substituted as JSON.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{Claim, Rule};

pub const RULES_CONTENTS_KEY: &str = "Rules_contents";
pub const RULE_LIST_KEY: &str = "R_number_content_list";
pub const CLAIM_KEY: &str = "Claim";

#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum PromptError {
    #[error("template references unknown placeholder '{0}'")]
    MissingPlaceholder(String),

    #[error("placeholder '{placeholder}' has no field '{field}'")]
    UnknownField { placeholder: String, field: String },

    #[error("template has an empty placeholder at offset {0}")]
    EmptyPlaceholder(usize),

    #[error("template has an unterminated placeholder at offset {0}")]
    Unterminated(usize),

    #[error("template has an unmatched '}}' at offset {0}")]
    UnmatchedClose(usize),

    #[error("failed to build prompt context: {0}")]
    Context(String),
}

/// Rule as presented to the model: number, text and source document
#[derive(Debug, Serialize)]
struct RuleEntry<'a> {
    id: &'a str,
    content: &'a str,
    #[serde(rename = "DocumentName")]
    document_name: &'a str,
}

/// Substitute claim fields and the rule set into `template`
pub fn assemble(
    template: &str,
    claim: &Claim,
    rules: &[Rule],
    rule_contents: &[String],
) -> Result<String, PromptError> {
    let entries: Vec<RuleEntry<'_>> = rules
        .iter()
        .map(|r| RuleEntry {
            id: &r.id,
            content: &r.content,
            document_name: &r.source_document,
        })
        .collect();

    let mut context = Map::new();
    context.insert(
        RULES_CONTENTS_KEY.to_string(),
        serde_json::to_value(rule_contents).map_err(|e| PromptError::Context(e.to_string()))?,
    );
    context.insert(
        RULE_LIST_KEY.to_string(),
        serde_json::to_value(&entries).map_err(|e| PromptError::Context(e.to_string()))?,
    );
    context.insert(
        CLAIM_KEY.to_string(),
        serde_json::to_value(claim).map_err(|e| PromptError::Context(e.to_string()))?,
    );

    render_template(template, &context)
}

/// Render `template` against a named context
pub fn render_template(template: &str, context: &Map<String, Value>) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut expr = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    expr.push(c);
                }
                if !closed {
                    return Err(PromptError::Unterminated(offset));
                }

                let value = resolve(&expr, context, offset)?;
                match value {
                    Value::String(s) => out.push_str(s),
                    other => out.push_str(&other.to_string()),
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(PromptError::UnmatchedClose(offset));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Resolve `name`, `name[key]` or `name.key` chains against the context
fn resolve<'a>(
    expr: &str,
    context: &'a Map<String, Value>,
    offset: usize,
) -> Result<&'a Value, PromptError> {
    // Conversion and format specs are accepted and ignored
    let expr = expr
        .split(['!', ':'])
        .next()
        .unwrap_or_default()
        .trim();

    let name_end = expr.find(['[', '.']).unwrap_or(expr.len());
    let name = &expr[..name_end];
    if name.is_empty() {
        return Err(PromptError::EmptyPlaceholder(offset));
    }

    let mut value = context
        .get(name)
        .ok_or_else(|| PromptError::MissingPlaceholder(name.to_string()))?;

    let mut rest = &expr[name_end..];
    while !rest.is_empty() {
        let (field, remaining) = if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or(PromptError::Unterminated(offset))?;
            (&stripped[..close], &stripped[close + 1..])
        } else if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped.find(['[', '.']).unwrap_or(stripped.len());
            (&stripped[..end], &stripped[end..])
        } else {
            return Err(PromptError::MissingPlaceholder(expr.to_string()));
        };

        let next = match value {
            Value::Object(map) => map.get(field),
            Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        value = next.ok_or_else(|| PromptError::UnknownField {
            placeholder: name.to_string(),
            field: field.to_string(),
        })?;
        rest = remaining;
    }

    Ok(value)
}
