//! Population search, lookup by elastic id, and TSV export

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};

use veneer::fixup::prune_blank;
use veneer::rewrite::fields::POPULATION_FIELDS;
use veneer::rewrite::{MatchBroadener, RewriteChain, ShortQueryGate, TermFieldRewrite};
use veneer::search::{run_search, SearchOptions};

use crate::error::ApiError;
use crate::state::AppState;

use super::export::{run_export, ExportPayload};
use super::parse_optional_body;

const EXPORT_FIELDS: &[&str] =
    &["elasticId", "name", "superpopulation.name", "latitude", "longitude"];

fn rewrites(state: &AppState) -> RewriteChain {
    RewriteChain::new()
        .then(ShortQueryGate::new(state.settings.limits.min_query_len))
        .then(TermFieldRewrite::new(&POPULATION_FIELDS))
        .then(MatchBroadener)
}

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap).rewrite(rewrites(&state));
    let resp =
        run_search(state.backend.as_ref(), &state.settings.indices.population, body, &opts).await?;
    Ok(Json(resp))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let index = &state.settings.indices.population;
    if let Some(doc) = state.backend.get_doc(index, &id).await? {
        return Ok(Json(wrap_source(doc)));
    }
    let probe = json!({"size": 1, "query": {"term": {"elasticId.keyword": id}}});
    let resp = state.backend.search(index, &probe, true).await?;
    if let Some(hit) = resp.pointer("/hits/hits/0") {
        return Ok(Json(wrap_source(hit.clone())));
    }
    Err(ApiError::NotFound("Population".to_string()))
}

pub async fn export_tsv(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    payload: ExportPayload,
) -> Result<Response, ApiError> {
    run_export(
        &state,
        &state.settings.indices.population,
        &filename,
        payload,
        EXPORT_FIELDS,
        RewriteChain::new().then(TermFieldRewrite::new(&POPULATION_FIELDS)),
    )
    .await
}

fn wrap_source(mut envelope: Value) -> Value {
    let mut source = envelope
        .as_object_mut()
        .and_then(|doc| doc.remove("_source"))
        .unwrap_or(Value::Null);
    prune_blank(&mut source, &["overlappingPopulations"]);
    json!({"_source": source})
}
