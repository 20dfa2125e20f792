//! Keyword rewriting for exact-match clauses
//!
//! Exact filters must hit keyword fields (stored untokenised). The portal
//! still sends legacy names, `url`, `url.keywords`, `dataCollections.title`,
//! the old `.std` analysed subfields, which would silently match nothing if
//! forwarded as-is. A handful of generic suffix rules cover most of it;
//! each resource adds a small map for the renames the rules cannot derive.

use serde_json::{Map, Value};

use super::Rewrite;

/// Per-resource field renames that the generic rules cannot derive
pub struct FieldMap {
    entries: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(from, _)| *from == field)
            .map(|(_, to)| *to)
    }
}

pub static SAMPLE_FIELDS: FieldMap = FieldMap::new(&[
    ("dataCollections.title", "dataCollections.title.keyword"),
    ("dataCollections.title.std", "dataCollections.title.keyword"),
    ("populations.elasticId", "populations.elasticId.keyword"),
    ("populations.code", "populations.code.keyword"),
    ("populations.name", "populations.name.keyword"),
    ("populations.superpopulationCode", "populations.superpopulationCode.keyword"),
    ("populations.superpopulationName", "populations.superpopulationName.keyword"),
]);

pub static POPULATION_FIELDS: FieldMap = FieldMap::new(&[
    ("dataCollections.title", "dataCollections.title.keyword"),
    ("dataCollections.title.std", "dataCollections.title.keyword"),
]);

/// File documents store the shared UI filter fields flat, so the targets
/// differ from the nested layout the other resources use
pub static FILE_FIELDS: FieldMap = FieldMap::new(&[
    ("dataCollections.title", "dataCollections.keyword"),
    ("dataCollections.title.std", "dataCollections.keyword"),
    ("dataCollections", "dataCollections.keyword"),
    ("analysisGroup", "analysisGroup.keyword"),
    ("dataType", "dataType.keyword"),
    ("samples", "samples.keyword"),
    ("populations", "populations.keyword"),
    ("url", "url.keyword"),
    // legacy plural, still sent by saved portal links
    ("url.keywords", "url.keyword"),
]);

pub static DATA_COLLECTION_FIELDS: FieldMap = FieldMap::new(&[
    ("title", "title.keyword"),
    ("title.std", "title.keyword"),
    ("shortTitle", "shortTitle.keyword"),
    ("shortTitle.std", "shortTitle.keyword"),
]);

/// Map a field name to its exact (`.keyword`) counterpart.
///
/// Priority: already `.keyword` wins, then the resource map, then the
/// generic rules (`.std` and `.keywords` suffixes, bare `url`,
/// `dataCollections.title`). Unknown fields come back unchanged.
pub fn keyword_field(field: &str, map: Option<&FieldMap>) -> String {
    if field.ends_with(".keyword") {
        return field.to_string();
    }
    if let Some(map) = map {
        if let Some(mapped) = map.get(field) {
            return mapped.to_string();
        }
    }
    if let Some(stem) = field.strip_suffix(".std") {
        return format!("{stem}.keyword");
    }
    if let Some(stem) = field.strip_suffix(".keywords") {
        return format!("{stem}.keyword");
    }
    if field == "url" {
        return "url.keyword".to_string();
    }
    if field == "dataCollections.title" {
        return "dataCollections.title.keyword".to_string();
    }
    field.to_string()
}

/// Rewrite the field names inside `term`/`terms` clauses to their keyword
/// counterparts, anywhere in the tree. Values and clause order are
/// preserved; full-text clauses keep their analysed fields.
pub fn rewrite_terms(node: &Value, map: &FieldMap) -> Value {
    match node {
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (key, value) in obj {
                match value {
                    Value::Object(clause) if key == "term" || key == "terms" => {
                        let rewritten = clause
                            .iter()
                            .map(|(field, spec)| {
                                (keyword_field(field, Some(map)), rewrite_terms(spec, map))
                            })
                            .collect();
                        out.insert(key.clone(), Value::Object(rewritten));
                    }
                    _ => {
                        out.insert(key.clone(), rewrite_terms(value, map));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| rewrite_terms(item, map)).collect())
        }
        leaf => leaf.clone(),
    }
}

/// [`Rewrite`] wrapper carrying a resource's field map
pub struct TermFieldRewrite {
    map: &'static FieldMap,
}

impl TermFieldRewrite {
    pub fn new(map: &'static FieldMap) -> Self {
        Self { map }
    }
}

impl Rewrite for TermFieldRewrite {
    fn name(&self) -> &str {
        "term_fields"
    }

    fn apply(&self, body: Value) -> Value {
        rewrite_terms(&body, self.map)
    }
}
