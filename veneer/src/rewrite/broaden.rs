//! Broad matching for `multi_match` queries
//!
//! The portal's search box sends one `multi_match` over a list of analysed
//! fields. On its own that misses what the old backend used to find:
//! substrings ("GBR" inside a description), partial URLs, mixed case. Each
//! `multi_match` is expanded into `bool.should` holding the original
//! analysed clause plus a case-insensitive wildcard on every field with a
//! keyword counterpart, with `minimum_should_match: 1`.

use serde_json::{json, Value};

use super::fields::keyword_field;
use super::Rewrite;

/// Treat `+` as a space when the text arrives URL-encoded (for example
/// "MAGE+RNA-seq" from a pasted link). Only applies when the string has no
/// real space, so plus signs inside spaced queries survive.
pub fn decode_plus(text: &str) -> String {
    let text = text.trim();
    if !text.contains(' ') && text.contains('+') {
        text.replace('+', " ")
    } else {
        text.to_string()
    }
}

/// Wrap the text in `*...*` unless the caller already placed wildcards
pub fn wrap_wildcards(text: &str) -> String {
    let text = text.trim();
    if text.contains('*') {
        text.to_string()
    } else {
        format!("*{text}*")
    }
}

/// Expand every `multi_match` clause in the tree; everything else recurses
/// unchanged
pub fn broaden_match(node: &Value) -> Value {
    match node {
        Value::Object(obj) => {
            if let Some(Value::Object(mm)) = obj.get("multi_match") {
                let raw = match mm.get("query") {
                    Some(Value::String(text)) => text.trim().to_string(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                };
                let text = decode_plus(&raw);

                let mut kept = mm.clone();
                kept.insert("query".to_string(), Value::String(text.clone()));

                let mut should = vec![json!({"multi_match": kept})];
                if let Some(Value::Array(fields)) = mm.get("fields") {
                    for field in fields {
                        let Some(name) = field.as_str() else { continue };
                        let exact = keyword_field(name, None);
                        if exact.ends_with(".keyword") {
                            should.push(json!({
                                "wildcard": {
                                    exact: {
                                        "value": wrap_wildcards(&text),
                                        "case_insensitive": true
                                    }
                                }
                            }));
                        }
                    }
                }

                return json!({"bool": {"should": should, "minimum_should_match": 1}});
            }

            Value::Object(
                obj.iter()
                    .map(|(key, value)| (key.clone(), broaden_match(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(broaden_match).collect()),
        leaf => leaf.clone(),
    }
}

pub struct MatchBroadener;

impl Rewrite for MatchBroadener {
    fn name(&self) -> &str {
        "broaden_match"
    }

    fn apply(&self, body: Value) -> Value {
        broaden_match(&body)
    }
}
