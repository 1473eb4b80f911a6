//! Defensive decoding of backend payloads.
//!
//! The reasoning backend promises JSON matching a requested schema but does
//! not guarantee it: replies show up wrapped in markdown fences, preceded by
//! prose, missing fields, or as no JSON at all. This module turns whatever
//! arrived into an object with every expected field present, substituting
//! documented fallbacks instead of raising.
//!
//! Decoding is tagged, not thrown: [`Normalized::degraded`] records that a
//! substitution happened so callers can annotate reduced confidence, while
//! the pipeline keeps moving.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Expected kind of one field in a backend reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string. Falls back to the spec's default text (empty if none).
    Text,
    /// An array (of anything). Falls back to an empty array.
    List,
}

/// Expectation for one field: name, kind, and the fallback for `Text`.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default_text: Option<String>,
}

impl FieldSpec {
    /// Text field falling back to an empty string.
    pub fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            default_text: None,
        }
    }

    /// Text field with a caller-supplied fallback (e.g. echoing the
    /// original requirements when a fixed manifest is missing).
    pub fn text_or(name: &'static str, default: impl Into<String>) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            default_text: Some(default.into()),
        }
    }

    /// List field falling back to an empty array.
    pub fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::List,
            default_text: None,
        }
    }

    fn fallback(&self) -> Value {
        match self.kind {
            FieldKind::Text => Value::String(self.default_text.clone().unwrap_or_default()),
            FieldKind::List => Value::Array(Vec::new()),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self.kind {
            FieldKind::Text => value.is_string(),
            FieldKind::List => value.is_array(),
        }
    }
}

/// Outcome of normalization. `value` is always an object containing every
/// field from the spec; `degraded` is true when anything was substituted.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub value: Value,
    pub degraded: bool,
}

impl Normalized {
    /// Fetch a text field. Safe after `normalize` guaranteed presence.
    pub fn text(&self, name: &str) -> String {
        self.value[name].as_str().unwrap_or_default().to_string()
    }
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"))
}

/// Find the first JSON object in a payload: bare JSON, fenced JSON, or a
/// brace-delimited substring buried in prose.
fn extract_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(captures) = fence_pattern().captures(raw) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&captures[1]) {
            return Some(value);
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Decode `raw` against `fields`.
///
/// Missing and wrong-kind fields are replaced by their fallbacks; fields
/// outside the spec pass through untouched. Never fails.
pub fn normalize(raw: &str, fields: &[FieldSpec]) -> Normalized {
    let (mut object, mut degraded) = match extract_object(raw) {
        Some(Value::Object(map)) => (map, false),
        _ => {
            debug!(payload_len = raw.len(), "no JSON object in backend payload, using fallbacks");
            (Map::new(), true)
        }
    };

    for field in fields {
        let ok = object.get(field.name).is_some_and(|value| field.matches(value));
        if !ok {
            object.insert(field.name.to_string(), field.fallback());
            degraded = true;
        }
    }

    Normalized {
        value: Value::Object(object),
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::text("searchQuery"),
            FieldSpec::list("issues"),
        ]
    }

    #[test]
    fn test_clean_payload_not_degraded() {
        let raw = r#"{"searchQuery": "numpy tensorflow compatibility", "issues": []}"#;
        let normalized = normalize(raw, &fields());
        assert!(!normalized.degraded);
        assert_eq!(normalized.text("searchQuery"), "numpy tensorflow compatibility");
    }

    #[test]
    fn test_fenced_payload_is_unwrapped() {
        let raw = "Here you go:\n```json\n{\"searchQuery\": \"q\", \"issues\": []}\n```\nDone.";
        let normalized = normalize(raw, &fields());
        assert!(!normalized.degraded);
        assert_eq!(normalized.text("searchQuery"), "q");
    }

    #[test]
    fn test_json_buried_in_prose() {
        let raw = "The answer is {\"searchQuery\": \"q\", \"issues\": [{\"packageName\": \"numpy\"}]} hope that helps";
        let normalized = normalize(raw, &fields());
        assert!(!normalized.degraded);
        assert_eq!(normalized.value["issues"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_garbage_payload_degrades_to_fallbacks() {
        let normalized = normalize("I couldn't produce JSON, sorry!", &fields());
        assert!(normalized.degraded);
        assert_eq!(normalized.text("searchQuery"), "");
        assert!(normalized.value["issues"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_gets_default() {
        let raw = r#"{"issues": []}"#;
        let normalized = normalize(
            raw,
            &[
                FieldSpec::text_or("fixedRequirements", "numpy==1.26.4"),
                FieldSpec::list("issues"),
            ],
        );
        assert!(normalized.degraded);
        assert_eq!(normalized.text("fixedRequirements"), "numpy==1.26.4");
    }

    #[test]
    fn test_wrong_kind_is_replaced() {
        let raw = r#"{"searchQuery": 42, "issues": "none"}"#;
        let normalized = normalize(raw, &fields());
        assert!(normalized.degraded);
        assert_eq!(normalized.text("searchQuery"), "");
        assert!(normalized.value["issues"].is_array());
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let raw = r#"{"searchQuery": "q", "issues": [], "confidence": 0.9}"#;
        let normalized = normalize(raw, &fields());
        assert!(!normalized.degraded);
        assert_eq!(normalized.value["confidence"], 0.9);
    }
}
