//! Response Extraction
//!
//! Recovers structured JSON from free-form model text. Models routinely wrap
//! JSON in prose or markdown code fences, and occasionally emit small syntax
//! slips. Every pipeline stage that expects structured output goes through
//! [`extract_structured`]:
//!
//! 1. Strip code-fence wrappers (` ```json ... ``` `), including a fenced
//!    block that follows leading prose.
//! 2. Parse directly.
//! 3. Slice from the first opening brace/bracket to the last closing one of
//!    the same class and parse the slice.
//! 4. Apply the ordered [`REPAIR_RULES`] once and parse again.
//!
//! Failures carry the offending excerpt for diagnostics.

use quill_sdk::errors::QuillError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Maximum number of characters of model output attached to an error
pub const EXCERPT_LIMIT: usize = 200;

/// A deterministic textual repair applied before giving up on a parse
#[derive(Debug)]
pub struct RepairRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

/// Repairs, applied once and in this order
pub const REPAIR_RULES: &[RepairRule] = &[
    RepairRule {
        name: "trailing_comma_before_array_end",
        pattern: r"\},\s*\]",
        replacement: "}]",
    },
    RepairRule {
        name: "missing_comma_between_objects",
        pattern: r"\}\s*\{",
        replacement: "},{",
    },
];

static COMPILED_REPAIRS: OnceLock<Vec<(&'static RepairRule, Regex)>> = OnceLock::new();

fn compiled_repairs() -> &'static [(&'static RepairRule, Regex)] {
    COMPILED_REPAIRS.get_or_init(|| {
        REPAIR_RULES
            .iter()
            .filter_map(|rule| match Regex::new(rule.pattern) {
                Ok(regex) => Some((rule, regex)),
                Err(e) => {
                    tracing::warn!("Skipping repair rule {}: {}", rule.name, e);
                    None
                }
            })
            .collect()
    })
}

/// Strip a code-fence wrapper from model text.
///
/// Handles a reply that starts with a fence (language tag optional, trailing
/// prose after the closing fence dropped) and a fenced block embedded after
/// leading prose. Text without fences is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the language tag line (e.g. "json\n")
        let body = match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => rest,
        };
        let body = match body.rfind("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim();
    }

    fenced_block(trimmed).map(str::trim).unwrap_or(trimmed)
}

/// Extract the body of the first markdown code fence in the text.
///
/// The opening fence must start a line, so backticks inside a JSON string
/// never open a block. The body runs to the last fence in the text.
fn fenced_block(content: &str) -> Option<&str> {
    let fence_start = content
        .match_indices("```")
        .map(|(i, _)| i)
        .find(|&i| starts_line(content, i))?;
    let after_opening = &content[fence_start + 3..];

    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].rfind("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

fn starts_line(content: &str, index: usize) -> bool {
    let before = content[..index].trim_end_matches([' ', '\t']);
    before.is_empty() || before.ends_with('\n')
}

/// Recover a JSON object or array from model text.
///
/// # Errors
///
/// - `NoStructureFound` when the text contains no brace/bracket pair
/// - `MalformedStructure` when a candidate was found but could not be
///   parsed, even after the repair rules
pub fn extract_structured(text: &str) -> Result<Value, QuillError> {
    let trimmed = text.trim();
    let cleaned = strip_code_fences(trimmed);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() || value.is_array() {
            return Ok(value);
        }
    }

    // Fall back to the unstripped text when the fence body holds no structure
    let candidates = [locate_structure(cleaned), locate_structure(trimmed)];
    let mut first_failure: Option<(&str, serde_json::Error)> = None;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                if first_failure.is_none() {
                    first_failure = Some((candidate, e));
                }
            }
        }
    }

    let (candidate, first_error) = first_failure.ok_or_else(|| QuillError::NoStructureFound {
        excerpt: excerpt(text),
    })?;

    let repaired = apply_repairs(candidate);
    if repaired != candidate {
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            tracing::debug!("Recovered model JSON after textual repair");
            return Ok(value);
        }
    }

    Err(QuillError::MalformedStructure {
        reason: first_error.to_string(),
        excerpt: excerpt(candidate),
    })
}

/// Like [`extract_structured`] but requires a top-level JSON object.
pub fn extract_object(text: &str) -> Result<Map<String, Value>, QuillError> {
    match extract_structured(text)? {
        Value::Object(map) => Ok(map),
        other => Err(QuillError::MalformedStructure {
            reason: format!("expected a JSON object, found {}", value_kind(&other)),
            excerpt: excerpt(text),
        }),
    }
}

/// Slice from the first opening brace/bracket to the last closer of the same class.
fn locate_structure(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Apply every repair rule once, in order.
pub fn apply_repairs(text: &str) -> String {
    let mut out = text.to_string();
    for (rule, regex) in compiled_repairs() {
        let next = regex.replace_all(&out, rule.replacement).into_owned();
        if next != out {
            tracing::trace!("Applied repair rule {}", rule.name);
            out = next;
        }
    }
    out
}

/// First `EXCERPT_LIMIT` characters of `text`.
pub fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_LIMIT {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(EXCERPT_LIMIT).collect();
        format!("{}...", head)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
