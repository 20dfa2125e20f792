//! Short-query gating
//!
//! A one-character free-text query matches most of the corpus and puts a
//! wildcard scan on the cluster for results nobody asked for. Anything
//! under the minimum length is swapped for `match_none` before dispatch,
//! so the portal still receives a well-formed empty result. Exact
//! `term`/`terms` filters are never gated.

use serde_json::{json, Value};

use super::Rewrite;

const TEXT_CLAUSES: [&str; 3] = ["multi_match", "query_string", "simple_query_string"];
const PER_FIELD_CLAUSES: [&str; 2] = ["match", "match_phrase"];

/// Replace too-short free-text queries with `match_none`
pub struct ShortQueryGate {
    min_len: usize,
}

impl ShortQueryGate {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }

    /// Missing text counts as empty, so it gates
    fn too_short(&self, text: Option<&Value>) -> bool {
        let text = match text {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };
        text.chars().count() < self.min_len
    }

    fn should_gate(&self, query: &Value) -> bool {
        let Some(query) = query.as_object() else {
            return false;
        };

        for clause in TEXT_CLAUSES {
            if let Some(Value::Object(spec)) = query.get(clause) {
                if self.too_short(spec.get("query")) {
                    return true;
                }
            }
        }

        // match/match_phrase take {"field": "text"} or {"field": {"query": "text"}}
        for clause in PER_FIELD_CLAUSES {
            if let Some(Value::Object(fields)) = query.get(clause) {
                for spec in fields.values() {
                    let gated = match spec {
                        Value::Object(spec) => self.too_short(spec.get("query")),
                        Value::String(_) => self.too_short(Some(spec)),
                        _ => false,
                    };
                    if gated {
                        return true;
                    }
                }
            }
        }

        false
    }
}

impl Rewrite for ShortQueryGate {
    fn name(&self) -> &str {
        "short_query_gate"
    }

    fn apply(&self, mut body: Value) -> Value {
        let gated = body.get("query").map_or(false, |query| self.should_gate(query));
        if gated {
            if let Some(request) = body.as_object_mut() {
                request.insert("query".to_string(), json!({"match_none": {}}));
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gate() -> ShortQueryGate {
        ShortQueryGate::new(2)
    }

    #[test]
    fn single_character_multi_match_is_gated() {
        let out = gate().apply(json!({
            "query": {"multi_match": {"query": "a", "fields": ["name.std"]}},
            "size": 10
        }));
        assert_eq!(out["query"], json!({"match_none": {}}));
        // the rest of the request survives
        assert_eq!(out["size"], json!(10));
    }

    #[test]
    fn two_characters_pass_at_the_default_minimum() {
        let body = json!({"query": {"multi_match": {"query": "ab", "fields": ["name.std"]}}});
        assert_eq!(gate().apply(body.clone()), body);
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let out = gate().apply(json!({"query": {"query_string": {"query": "   "}}}));
        assert_eq!(out["query"], json!({"match_none": {}}));
    }

    #[test]
    fn padded_text_is_measured_after_trimming() {
        let out = gate().apply(json!({"query": {"simple_query_string": {"query": " a "}}}));
        assert_eq!(out["query"], json!({"match_none": {}}));
    }

    #[test]
    fn missing_query_text_is_gated() {
        let out = gate().apply(json!({"query": {"multi_match": {"fields": ["name.std"]}}}));
        assert_eq!(out["query"], json!({"match_none": {}}));
    }

    #[test]
    fn match_accepts_both_field_spec_shapes() {
        let out = gate().apply(json!({"query": {"match": {"name": "a"}}}));
        assert_eq!(out["query"], json!({"match_none": {}}));

        let out = gate().apply(json!({"query": {"match": {"name": {"query": "a"}}}}));
        assert_eq!(out["query"], json!({"match_none": {}}));

        let body = json!({"query": {"match_phrase": {"name": {"query": "HG00096"}}}});
        assert_eq!(gate().apply(body.clone()), body);
    }

    #[test]
    fn exact_filters_are_never_gated() {
        let body = json!({"query": {"terms": {"populations.code.keyword": ["X"]}}});
        assert_eq!(gate().apply(body.clone()), body);

        let body = json!({"query": {"term": {"sex": "m"}}});
        assert_eq!(gate().apply(body.clone()), body);
    }

    #[test]
    fn zero_minimum_disables_the_gate() {
        let body = json!({"query": {"multi_match": {"query": "", "fields": ["name.std"]}}});
        assert_eq!(ShortQueryGate::new(0).apply(body.clone()), body);
    }

    #[test]
    fn bodies_without_a_query_pass_through() {
        let body = json!({"size": 5});
        assert_eq!(gate().apply(body.clone()), body);
        assert_eq!(gate().apply(json!("junk")), json!("junk"));
    }
}
