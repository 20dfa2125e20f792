//! TSV projection of search hits
//!
//! The portal's "Download the list" button posts the current search plus a
//! list of dotted `_source` paths; the reply is a spreadsheet-ready TSV.
//! Cells never contain tabs or newlines, lists collapse to separator-joined
//! strings, nested objects render as compact JSON.

use serde::Deserialize;
use serde_json::Value;

/// Parsed export payload, however it was delivered
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    /// Dotted `_source` paths, plus the special `_id`/`_index` columns
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    /// Header labels; used only when the count matches `fields`
    #[serde(default)]
    pub column_names: Option<Vec<String>>,
    /// Query to export; match-everything when absent
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Clamp a requested export size to the configured cap
pub fn clamp_size(requested: Option<i64>, cap: i64) -> i64 {
    match requested {
        Some(size) if size >= 0 && size <= cap => size,
        _ => cap,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Resolve a dotted `_source` path such as "populations.code".
///
/// When a segment lands on an array, the rest of the path is applied to
/// each object element and the non-empty results are collected, flattening
/// one level of nested lists. Missing paths resolve to null.
pub fn resolve_path(source: &Value, path: &str) -> Value {
    let mut current = source.clone();
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part).cloned().unwrap_or(Value::Null),
            Value::Array(items) => {
                let mut collected = Vec::new();
                for item in items {
                    let Value::Object(map) = item else { continue };
                    match map.get(part) {
                        Some(Value::Array(nested)) => {
                            collected.extend(
                                nested.iter().filter(|value| !is_empty_value(value)).cloned(),
                            );
                        }
                        Some(value) if !is_empty_value(value) => collected.push(value.clone()),
                        _ => {}
                    }
                }
                Value::Array(collected)
            }
            _ => return Value::Null,
        };
    }
    current
}

/// Render one value as a single TSV cell. Tabs, carriage returns and
/// newlines are replaced with spaces so a cell can never break the row.
pub fn tsv_cell(value: &Value, sep: &str) -> String {
    let rendered = match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .filter(|item| !is_empty_value(item))
            .map(|item| match item {
                Value::String(text) => text.clone(),
                Value::Bool(flag) => flag.to_string(),
                Value::Number(number) => number.to_string(),
                nested => serde_json::to_string(nested).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join(sep),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    };
    rendered.replace('\t', " ").replace('\r', " ").replace('\n', " ")
}

/// Column header line; custom labels apply only when the count matches
pub fn header_row(columns: &[String], labels: Option<&[String]>) -> String {
    match labels {
        Some(labels) if labels.len() == columns.len() => labels.join("\t"),
        _ => columns.join("\t"),
    }
}

/// One TSV line per hit. `_id` and `_index` come from the hit envelope;
/// every other column is a dotted path into `_source`.
pub fn rows<'a>(
    hits: &'a [Value],
    columns: &'a [String],
    sep: &'a str,
) -> impl Iterator<Item = String> + 'a {
    hits.iter().map(move |hit| {
        let null = Value::Null;
        let source = hit.get("_source").unwrap_or(&null);
        columns
            .iter()
            .map(|column| match column.as_str() {
                "_id" | "_index" => tsv_cell(hit.get(column.as_str()).unwrap_or(&null), sep),
                path => tsv_cell(&resolve_path(source, path), sep),
            })
            .collect::<Vec<_>>()
            .join("\t")
    })
}

/// Assemble the full document: header line plus one line per hit, every
/// line newline-terminated
pub fn render(hits: &[Value], columns: &[String], labels: Option<&[String]>, sep: &str) -> String {
    let mut out = String::new();
    out.push_str(&header_row(columns, labels));
    out.push('\n');
    for row in rows(hits, columns, sep) {
        out.push_str(&row);
        out.push('\n');
    }
    out
}
