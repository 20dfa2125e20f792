//! File search and TSV export.
//!
//! File documents are the largest in the cluster; a bare search would
//! ship complete sample lists nobody asked for. Requests without a
//! `_source` projection get the portal's column set.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};

use veneer::rewrite::fields::FILE_FIELDS;
use veneer::rewrite::{MatchBroadener, RewriteChain, ShortQueryGate, TermFieldRewrite};
use veneer::search::{run_search, SearchOptions};
use veneer::synonyms::ValueNormaliser;

use crate::error::ApiError;
use crate::state::AppState;

use super::export::{run_export, ExportPayload};
use super::parse_optional_body;

const DEFAULT_SOURCE: [&str; 6] =
    ["url", "md5", "dataType", "analysisGroup", "dataCollections", "samples"];

const EXPORT_FIELDS: &[&str] =
    &["url", "md5", "dataType", "analysisGroup", "dataCollections", "samples", "populations"];

fn rewrites(state: &AppState) -> RewriteChain {
    RewriteChain::new()
        .then(ShortQueryGate::new(state.settings.limits.min_query_len))
        .then(TermFieldRewrite::new(&FILE_FIELDS))
        .then(MatchBroadener)
        .then(ValueNormaliser::new(state.synonyms.clone()))
}

fn ensure_source(mut body: Value) -> Value {
    if let Some(request) = body.as_object_mut() {
        request.entry("_source").or_insert_with(|| json!(DEFAULT_SOURCE));
    }
    body
}

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    state.synonyms.refresh_if_stale(state.backend.as_ref()).await;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap)
        .rewrite(rewrites(&state))
        .ensure(ensure_source);
    let resp =
        run_search(state.backend.as_ref(), &state.settings.indices.file, body, &opts).await?;
    Ok(Json(resp))
}

pub async fn export_tsv(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    payload: ExportPayload,
) -> Result<Response, ApiError> {
    run_export(
        &state,
        &state.settings.indices.file,
        &filename,
        payload,
        EXPORT_FIELDS,
        RewriteChain::new().then(TermFieldRewrite::new(&FILE_FIELDS)).then(MatchBroadener),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{state_with, StubBackend};
    use veneer::export::ExportRequest;

    #[tokio::test]
    async fn missing_source_projection_gets_the_default_columns() {
        let (state, backend) = state_with(StubBackend::ok());
        search(State(state), Bytes::new()).await.unwrap();

        let sent = backend.last_search("file").expect("search dispatched");
        assert_eq!(
            sent["_source"],
            json!(["url", "md5", "dataType", "analysisGroup", "dataCollections", "samples"])
        );
    }

    #[tokio::test]
    async fn an_explicit_source_projection_is_respected() {
        let (state, backend) = state_with(StubBackend::ok());
        let body = Bytes::from(r#"{"_source": ["url"]}"#);
        search(State(state), body).await.unwrap();

        let sent = backend.last_search("file").expect("search dispatched");
        assert_eq!(sent["_source"], json!(["url"]));
    }

    #[tokio::test]
    async fn flat_filter_fields_and_group_values_are_rewritten() {
        let (state, backend) = state_with(StubBackend::ok());
        let body = Bytes::from(
            r#"{"query": {"bool": {"filter": [
                {"terms": {"dataCollections.title": ["HGSVC2"]}},
                {"terms": {"analysisGroup": ["hifi"]}}
            ]}}}"#,
        );
        search(State(state), body).await.unwrap();

        let sent = backend.last_search("file").expect("search dispatched");
        let filters = sent["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filters[0]["terms"]["dataCollections.keyword"], json!(["HGSVC2"]));
        assert_eq!(filters[1]["terms"]["analysisGroup.keyword"], json!(["PacBio HiFi"]));
    }

    #[tokio::test]
    async fn export_projects_the_requested_columns() {
        use http_body_util::BodyExt;

        let hits = json!({"hits": {"hits": [
            {"_id": "f1", "_source": {"url": "ftp://x/f1", "dataType": "bam"}}
        ]}});
        let (state, backend) = state_with(StubBackend::ok().with_search_response(hits));
        let payload = ExportPayload(Some(ExportRequest {
            fields: Some(vec!["url".to_string(), "dataType".to_string()]),
            query: Some(json!({"term": {"url.keywords": "ftp://x/f1"}})),
            ..ExportRequest::default()
        }));
        let resp = export_tsv(State(state), Path("files.tsv".to_string()), payload).await.unwrap();

        assert_eq!(resp.headers()["content-disposition"], "attachment; filename=\"files.tsv\"");
        assert_eq!(resp.headers()["cache-control"], "no-store");
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text, "url\tdataType\nftp://x/f1\tbam\n");

        let sent = backend.last_search("file").expect("export dispatched");
        // the legacy plural is rewritten on the way out
        assert_eq!(sent["query"]["term"]["url.keyword"], json!("ftp://x/f1"));
        assert_eq!(sent["_source"], json!(["url", "dataType"]));
    }
}
