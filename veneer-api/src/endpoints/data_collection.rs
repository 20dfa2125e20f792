//! Data collection search.
//!
//! Broadening runs before the keyword rewrite here. The wildcard arms
//! derive their targets from the generic suffix rules alone, so the
//! order does not change the dispatched query.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use veneer::rewrite::fields::DATA_COLLECTION_FIELDS;
use veneer::rewrite::{MatchBroadener, RewriteChain, ShortQueryGate, TermFieldRewrite};
use veneer::search::{run_search, SearchOptions};

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_optional_body;

fn rewrites(state: &AppState) -> RewriteChain {
    RewriteChain::new()
        .then(ShortQueryGate::new(state.settings.limits.min_query_len))
        .then(MatchBroadener)
        .then(TermFieldRewrite::new(&DATA_COLLECTION_FIELDS))
}

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap).rewrite(rewrites(&state));
    let resp =
        run_search(state.backend.as_ref(), &state.settings.indices.data_collections, body, &opts)
            .await?;
    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{state_with, StubBackend};
    use serde_json::json;

    #[tokio::test]
    async fn title_filters_land_on_the_keyword_field() {
        let (state, backend) = state_with(StubBackend::ok());
        let body = Bytes::from(r#"{"query": {"term": {"title.std": "Human Genome Diversity Project"}}}"#);
        search(State(state), body).await.unwrap();

        let sent = backend.last_search("data_collections").expect("search dispatched");
        assert_eq!(
            sent["query"]["term"]["title.keyword"],
            json!("Human Genome Diversity Project")
        );
    }

    #[tokio::test]
    async fn free_text_is_broadened_with_plus_decoding() {
        let (state, backend) = state_with(StubBackend::ok());
        let body = Bytes::from(
            r#"{"query": {"multi_match": {"query": "MAGE+RNA-seq", "fields": ["title.std", "shortTitle.std"]}}}"#,
        );
        search(State(state), body).await.unwrap();

        let sent = backend.last_search("data_collections").expect("search dispatched");
        let should = sent["query"]["bool"]["should"].as_array().expect("should arms");
        assert_eq!(should.len(), 3);
        assert_eq!(should[0]["multi_match"]["query"], json!("MAGE RNA-seq"));
        assert_eq!(
            should[1]["wildcard"]["title.keyword"],
            json!({"value": "*MAGE RNA-seq*", "case_insensitive": true})
        );
        assert_eq!(
            should[2]["wildcard"]["shortTitle.keyword"],
            json!({"value": "*MAGE RNA-seq*", "case_insensitive": true})
        );
    }
}
