//! Small per-document repairs applied before documents reach the portal

use serde_json::Value;

/// Pick the label the portal should display for a reference document.
/// Earliest non-blank wins: description, title, shortTitle, code.
pub fn choose_label(doc: &Value) -> String {
    for key in ["description", "title", "shortTitle", "code"] {
        if let Some(text) = doc.get(key).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return text.to_string();
            }
        }
    }
    String::new()
}

/// Blank means the portal would render an empty box: null, empty or
/// whitespace-only string, empty array, array of blanks, empty object
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty() || items.iter().all(is_blank),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Drop the listed keys from a document when their values are blank.
/// Other keys, and listed keys with real values, are left alone.
pub fn prune_blank(doc: &mut Value, keys: &[&str]) {
    if let Value::Object(map) = doc {
        for key in keys {
            if map.get(*key).is_some_and(is_blank) {
                map.shift_remove(*key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_wins_when_present() {
        let doc = json!({
            "description": "Low coverage WGS",
            "title": "lcWGS",
            "shortTitle": "lc",
            "code": "low_coverage"
        });
        assert_eq!(choose_label(&doc), "Low coverage WGS");
    }

    #[test]
    fn blank_candidates_are_skipped() {
        let doc = json!({"description": "  ", "title": "", "shortTitle": "Exome", "code": "exome"});
        assert_eq!(choose_label(&doc), "Exome");
    }

    #[test]
    fn code_is_the_last_resort() {
        assert_eq!(choose_label(&json!({"code": "ont"})), "ont");
    }

    #[test]
    fn all_blank_yields_the_empty_string() {
        assert_eq!(choose_label(&json!({})), "");
        assert_eq!(choose_label(&json!({"description": null, "title": 7})), "");
    }

    #[test]
    fn blank_shapes() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("   ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!(["", null, []])));
        assert!(is_blank(&json!({})));
    }

    #[test]
    fn non_blank_shapes() {
        assert!(!is_blank(&json!("x")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!(["", "x"])));
        assert!(!is_blank(&json!({"a": null})));
    }

    #[test]
    fn listed_blank_keys_are_dropped() {
        let mut doc = json!({"name": "HG00096", "sharedSamples": []});
        prune_blank(&mut doc, &["sharedSamples"]);
        assert_eq!(doc, json!({"name": "HG00096"}));
    }

    #[test]
    fn populated_keys_survive() {
        let mut doc = json!({"sharedSamples": ["HG00097"]});
        prune_blank(&mut doc, &["sharedSamples"]);
        assert_eq!(doc, json!({"sharedSamples": ["HG00097"]}));
    }

    #[test]
    fn unlisted_blank_keys_are_kept() {
        let mut doc = json!({"note": "", "sharedSamples": null});
        prune_blank(&mut doc, &["sharedSamples"]);
        assert_eq!(doc, json!({"note": ""}));
    }

    #[test]
    fn key_order_is_preserved_around_the_removal() {
        let mut doc = json!({"a": 1, "overlappingPopulations": [], "z": 2, "tail": 3});
        prune_blank(&mut doc, &["overlappingPopulations"]);
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "z", "tail"]);
    }

    #[test]
    fn non_object_documents_are_ignored() {
        let mut doc = json!(["x"]);
        prune_blank(&mut doc, &["anything"]);
        assert_eq!(doc, json!(["x"]));
    }
}
