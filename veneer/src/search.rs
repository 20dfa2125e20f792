//! Search orchestration
//!
//! One entry point, [`run_search`], takes every search request through the
//! same fixed sequence: body defaults, size clamping, rewrite chain,
//! resource-specific ensure hook, dispatch, postprocess hook, response
//! normalisation. Endpoints differ only in the [`SearchOptions`] they pass.

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::es::{normalise_response, SearchBackend};
use crate::rewrite::RewriteChain;

/// Final body adjustment before dispatch, after all rewrites
pub type EnsureFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Response adjustment; receives the raw response and the dispatched body
pub type PostprocessFn = Box<dyn Fn(Value, &Value) -> Value + Send + Sync>;

/// Per-endpoint configuration for [`run_search`]
pub struct SearchOptions {
    size_cap: i64,
    rewrite: Option<RewriteChain>,
    default_sort: Option<Value>,
    ensure: Option<EnsureFn>,
    postprocess: Option<PostprocessFn>,
}

impl SearchOptions {
    pub fn new(size_cap: i64) -> Self {
        Self {
            size_cap,
            rewrite: None,
            default_sort: None,
            ensure: None,
            postprocess: None,
        }
    }

    pub fn rewrite(mut self, chain: RewriteChain) -> Self {
        self.rewrite = Some(chain);
        self
    }

    /// Sort applied only when the request carries none of its own
    pub fn default_sort(mut self, sort: Value) -> Self {
        self.default_sort = Some(sort);
        self
    }

    pub fn ensure(mut self, ensure: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.ensure = Some(Box::new(ensure));
        self
    }

    pub fn postprocess(
        mut self,
        postprocess: impl Fn(Value, &Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.postprocess = Some(Box::new(postprocess));
        self
    }
}

/// Run one standardised search and shape the result for the portal.
///
/// - No body, or a non-object body, means match-everything.
/// - A missing or `null` `size` becomes the cap, as does an integer out of
///   range (the portal sends -1 for "all"); an in-range integer is kept;
///   any other non-integer size passes through for the cluster to reject.
/// - `track_total_hits` defaults to true so the portal shows real totals.
/// - Any backend failure surfaces as the generic upstream error; the
///   detail only goes to the log.
pub async fn run_search(
    backend: &dyn SearchBackend,
    index: &str,
    body: Option<Value>,
    opts: &SearchOptions,
) -> Result<Value> {
    let mut request = match body {
        Some(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert("query".to_string(), json!({"match_all": {}}));
            map
        }
    };

    match request.get("size") {
        None | Some(Value::Null) => {
            request.insert("size".to_string(), json!(opts.size_cap));
        }
        Some(Value::Number(n)) => {
            let in_range = n.as_i64().is_some_and(|size| size >= 0 && size <= opts.size_cap);
            let integer = n.is_i64() || n.is_u64();
            if integer && !in_range {
                request.insert("size".to_string(), json!(opts.size_cap));
            }
        }
        Some(_) => {}
    }

    request.entry("track_total_hits").or_insert(json!(true));

    if let Some(sort) = &opts.default_sort {
        if !request.contains_key("sort") {
            request.insert("sort".to_string(), sort.clone());
        }
    }

    let mut es_body = Value::Object(request);
    if let Some(chain) = &opts.rewrite {
        es_body = chain.apply(es_body);
    }
    if let Some(ensure) = &opts.ensure {
        es_body = ensure(es_body);
    }

    let raw = match backend.search(index, &es_body, true).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(index, error = %err, "search dispatch failed");
            return Err(Error::Upstream(err.to_string()));
        }
    };

    let resp = match &opts.postprocess {
        Some(postprocess) => postprocess(raw, &es_body),
        None => raw,
    };

    Ok(normalise_response(resp))
}
