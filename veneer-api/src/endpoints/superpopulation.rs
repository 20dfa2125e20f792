//! Superpopulation search. Five documents, no filters worth rewriting.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use veneer::search::{run_search, SearchOptions};

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_optional_body;

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap);
    let resp = run_search(state.backend.as_ref(), &state.settings.indices.superpopulation, body, &opts)
        .await?;
    Ok(Json(resp))
}
