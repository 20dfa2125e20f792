//! Sample search, lookup by name, and TSV export

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};

use veneer::fixup::prune_blank;
use veneer::rewrite::fields::SAMPLE_FIELDS;
use veneer::rewrite::{MatchBroadener, RewriteChain, ShortQueryGate, TermFieldRewrite};
use veneer::search::{run_search, SearchOptions};
use veneer::synonyms::ValueNormaliser;

use crate::error::ApiError;
use crate::state::AppState;

use super::export::{run_export, ExportPayload};
use super::parse_optional_body;

const EXPORT_FIELDS: &[&str] = &["_id", "name", "sex"];

fn rewrites(state: &AppState) -> RewriteChain {
    RewriteChain::new()
        .then(ShortQueryGate::new(state.settings.limits.min_query_len))
        .then(TermFieldRewrite::new(&SAMPLE_FIELDS))
        .then(MatchBroadener)
        .then(ValueNormaliser::new(state.synonyms.clone()))
}

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    state.synonyms.refresh_if_stale(state.backend.as_ref()).await;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap).rewrite(rewrites(&state));
    let resp =
        run_search(state.backend.as_ref(), &state.settings.indices.sample, body, &opts).await?;
    Ok(Json(resp))
}

/// Lookup by document id first; saved links predate the id scheme, so a
/// miss falls back to an exact name query.
pub async fn detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let index = &state.settings.indices.sample;
    if let Some(doc) = state.backend.get_doc(index, &name).await? {
        return Ok(Json(wrap_source(doc)));
    }
    let probe = json!({"size": 1, "query": {"term": {"name.keyword": name}}});
    let resp = state.backend.search(index, &probe, true).await?;
    if let Some(hit) = resp.pointer("/hits/hits/0") {
        return Ok(Json(wrap_source(hit.clone())));
    }
    Err(ApiError::NotFound("Sample".to_string()))
}

pub async fn export_tsv(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    payload: ExportPayload,
) -> Result<Response, ApiError> {
    run_export(
        &state,
        &state.settings.indices.sample,
        &filename,
        payload,
        EXPORT_FIELDS,
        RewriteChain::new().then(TermFieldRewrite::new(&SAMPLE_FIELDS)),
    )
    .await
}

/// Reduce a lookup envelope to the `_source` the portal reads.
/// `sharedSamples` is dropped when blank; most samples carry an empty
/// list there and the portal renders it as a broken section.
fn wrap_source(mut envelope: Value) -> Value {
    let mut source = envelope
        .as_object_mut()
        .and_then(|doc| doc.remove("_source"))
        .unwrap_or(Value::Null);
    prune_blank(&mut source, &["sharedSamples"]);
    json!({"_source": source})
}
