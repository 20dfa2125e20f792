//! Canonicalisation of analysis-group values
//!
//! Saved portal links and older UI builds send analysis-group values in
//! whatever spelling was current at the time: codes ("low_coverage"),
//! abbreviations ("lcWGS"), raw display labels. The index stores exactly
//! one canonical label per group, so an exact filter on any other spelling
//! returns zero hits. This module folds every known alias onto the
//! canonical label.
//!
//! A static seed table covers the vocabulary that must keep working even
//! when the cluster is unreachable. On top of that, the reference index is
//! polled at most once per TTL window and its documents (code, shortTitle,
//! title, description) are folded in, so newly added groups start matching
//! without a redeploy. A failed refresh is logged and swallowed; the
//! previous tables keep serving.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Settings;
use crate::error::Result;
use crate::es::SearchBackend;
use crate::fixup::choose_label;
use crate::rewrite::Rewrite;

/// Vocabulary that must resolve even when the reference index is down
const STATIC_GROUPS: &[(&str, &[&str])] = &[
    ("Low coverage WGS", &["low_coverage", "lcWGS"]),
    ("High coverage WGS", &["high_coverage", "hcWGS"]),
    ("Exome", &["exon_targetted", "wxs"]),
    ("PacBio HiFi", &["pacbio_hifi", "hifi"]),
    ("Oxford Nanopore Technologies", &["ont", "ont_wgs", "oxford nanopore"]),
    ("MAGE RNA-seq", &["mage", "rna_seq"]),
];

/// Collapse spelling variation: lowercase, alphanumerics only.
/// "Low coverage WGS", "low_coverage_wgs" and "LOW-COVERAGE WGS" all
/// produce the same key.
pub fn normalise_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Default)]
struct Tables {
    /// normalised alias -> canonical display label
    canonical: HashMap<String, String>,
    /// canonical display label -> alias spellings, registration order
    aliases: HashMap<String, Vec<String>>,
}

impl Tables {
    fn seeded() -> Self {
        let mut tables = Tables::default();
        for (label, aliases) in STATIC_GROUPS {
            tables.register(label, aliases.iter().copied());
        }
        tables
    }

    /// Register a canonical label and its alias spellings. The label is its
    /// own first alias. Conflicting keys are overwritten, so later entries
    /// win.
    fn register<'a>(&mut self, label: &'a str, aliases: impl Iterator<Item = &'a str>) {
        let known = self.aliases.entry(label.to_string()).or_default();
        for alias in std::iter::once(label).chain(aliases) {
            let alias = alias.trim();
            if alias.is_empty() {
                continue;
            }
            self.canonical.insert(normalise_key(alias), label.to_string());
            if !known.iter().any(|existing| existing == alias) {
                known.push(alias.to_string());
            }
        }
    }
}

/// TTL cache over the analysis-group alias tables
pub struct SynonymCache {
    tables: RwLock<Tables>,
    refreshed_at: RwLock<Option<DateTime<Utc>>>,
    refreshing: AtomicBool,
    ttl: Duration,
    fetch_size: usize,
    reference_index: String,
}

/// Releases the single-flight refresh slot on drop. Handler futures are
/// dropped when their client disconnects, which can abandon a refresh at
/// its backend await; the slot must come free regardless.
struct RefreshSlot<'a>(&'a AtomicBool);

impl Drop for RefreshSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SynonymCache {
    pub fn new(reference_index: &str, ttl_secs: i64, fetch_size: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::seeded()),
            refreshed_at: RwLock::new(None),
            refreshing: AtomicBool::new(false),
            ttl: Duration::seconds(ttl_secs),
            fetch_size,
            reference_index: reference_index.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.indices.analysis_group,
            settings.synonyms.refresh_ttl_secs,
            settings.synonyms.fetch_size,
        )
    }

    fn is_stale(&self) -> bool {
        match *self.refreshed_at.read() {
            Some(at) => Utc::now() - at > self.ttl,
            None => true,
        }
    }

    /// Rebuild the tables from the reference index when they are stale.
    ///
    /// At most one refresh runs at a time; concurrent callers proceed with
    /// the tables they already have rather than queue. Failures leave the
    /// previous tables in place and the staleness unchanged, so the next
    /// caller retries; a caller dropped mid-refresh frees the slot the
    /// same way.
    pub async fn refresh_if_stale(&self, backend: &dyn SearchBackend) {
        if !self.is_stale() {
            return;
        }
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        let _slot = RefreshSlot(&self.refreshing);

        match self.fetch_reference_docs(backend).await {
            Ok(docs) => {
                let mut tables = Tables::seeded();
                for doc in &docs {
                    let label = choose_label(doc);
                    if label.is_empty() {
                        continue;
                    }
                    let aliases = ["code", "shortTitle", "title", "description"]
                        .iter()
                        .filter_map(|key| doc.get(*key).and_then(Value::as_str));
                    tables.register(&label, aliases);
                }
                *self.tables.write() = tables;
                *self.refreshed_at.write() = Some(Utc::now());
                tracing::debug!(groups = docs.len(), "analysis-group synonym tables refreshed");
            }
            Err(err) => {
                tracing::debug!(error = %err, "synonym refresh failed, keeping previous tables");
            }
        }
    }

    async fn fetch_reference_docs(&self, backend: &dyn SearchBackend) -> Result<Vec<Value>> {
        let body = json!({
            "size": self.fetch_size,
            "query": {"match_all": {}},
            "sort": [
                {"displayOrder": {"order": "asc", "unmapped_type": "long"}},
                {"title.keyword": "asc"}
            ],
            "_source": ["code", "shortTitle", "title", "description"]
        });
        let resp = backend.search(&self.reference_index, &body, true).await?;
        let docs = resp
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().filter_map(|hit| hit.get("_source")).cloned().collect())
            .unwrap_or_default();
        Ok(docs)
    }

    /// Canonical label for a raw value, if the value is a known alias
    pub fn canonical(&self, raw: &str) -> Option<String> {
        self.tables.read().canonical.get(&normalise_key(raw)).cloned()
    }

    /// Canonical label, or the value unchanged when it is not a known alias
    pub fn canonicalise(&self, raw: &str) -> String {
        self.canonical(raw).unwrap_or_else(|| raw.to_string())
    }

    /// Expand values with every known alias spelling of their group. Input
    /// order is kept, aliases follow in registration order, duplicates are
    /// dropped.
    pub fn expand_aliases(&self, values: &[String]) -> Vec<String> {
        let tables = self.tables.read();
        let mut out: Vec<String> = Vec::new();
        for value in values {
            if !out.contains(value) {
                out.push(value.clone());
            }
            let label = tables.canonical.get(&normalise_key(value));
            if let Some(aliases) = label.and_then(|label| tables.aliases.get(label)) {
                for alias in aliases {
                    if !out.contains(alias) {
                        out.push(alias.clone());
                    }
                }
            }
        }
        out
    }
}

/// [`Rewrite`] that folds analysis-group values onto canonical labels.
///
/// Only string values are touched, never field names: values inside
/// `term`/`terms` clauses on the analysis-group field, and entries of
/// aggregation `include` lists on the same field. Unknown values pass
/// through, so genuinely new labels are not destroyed.
pub struct ValueNormaliser {
    cache: Arc<SynonymCache>,
}

impl ValueNormaliser {
    pub fn new(cache: Arc<SynonymCache>) -> Self {
        Self { cache }
    }

    fn target_field(field: &str) -> bool {
        matches!(field, "analysisGroup" | "analysisGroup.keyword")
    }

    fn fold_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.cache.canonicalise(s)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.fold_value(item)).collect())
            }
            other => other.clone(),
        }
    }

    /// `term` accepts `{"value": ...}` alongside the bare scalar
    fn fold_clause_spec(&self, spec: &Value) -> Value {
        match spec {
            Value::Object(opts) => Value::Object(
                opts.iter()
                    .map(|(key, value)| {
                        if key == "value" {
                            (key.clone(), self.fold_value(value))
                        } else {
                            (key.clone(), value.clone())
                        }
                    })
                    .collect(),
            ),
            other => self.fold_value(other),
        }
    }

    fn walk(&self, node: &Value) -> Value {
        match node {
            Value::Object(obj) => {
                let mut out = Map::with_capacity(obj.len());
                for (key, value) in obj {
                    let rewritten = match (key.as_str(), value) {
                        // query clause: keys are field names. The "field" key
                        // tells a terms aggregation body apart.
                        ("term" | "terms", Value::Object(clause))
                            if !clause.contains_key("field") =>
                        {
                            Value::Object(
                                clause
                                    .iter()
                                    .map(|(field, spec)| {
                                        if Self::target_field(field) {
                                            (field.clone(), self.fold_clause_spec(spec))
                                        } else {
                                            (field.clone(), self.walk(spec))
                                        }
                                    })
                                    .collect(),
                            )
                        }
                        ("terms", Value::Object(agg)) => {
                            let on_target = agg
                                .get("field")
                                .and_then(Value::as_str)
                                .map_or(false, Self::target_field);
                            Value::Object(
                                agg.iter()
                                    .map(|(key, value)| {
                                        if on_target && key == "include" {
                                            (key.clone(), self.fold_value(value))
                                        } else {
                                            (key.clone(), self.walk(value))
                                        }
                                    })
                                    .collect(),
                            )
                        }
                        _ => self.walk(value),
                    };
                    out.insert(key.clone(), rewritten);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.walk(item)).collect()),
            leaf => leaf.clone(),
        }
    }
}

impl Rewrite for ValueNormaliser {
    fn name(&self) -> &str {
        "analysis_group_values"
    }

    fn apply(&self, body: Value) -> Value {
        self.walk(&body)
    }
}
