//! Sitemap lookups. The sitemap index carries one small document per
//! portal page; the generator queries it by name.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use veneer::rewrite::{MatchBroadener, RewriteChain, ShortQueryGate};
use veneer::search::{run_search, SearchOptions};

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_optional_body;

fn rewrites(state: &AppState) -> RewriteChain {
    RewriteChain::new()
        .then(ShortQueryGate::new(state.settings.limits.min_query_len))
        .then(MatchBroadener)
}

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap).rewrite(rewrites(&state));
    let resp =
        run_search(state.backend.as_ref(), &state.settings.indices.sitemap, body, &opts).await?;
    Ok(Json(resp))
}
