//! Analysis group search with display-label fixups

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use veneer::fixup::choose_label;
use veneer::search::{run_search, SearchOptions};

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_optional_body;

pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let body = parse_optional_body(&body)?;
    let opts = SearchOptions::new(state.settings.limits.search_size_cap).postprocess(apply_labels);
    let resp =
        run_search(state.backend.as_ref(), &state.settings.indices.analysis_group, body, &opts)
            .await?;
    Ok(Json(resp))
}

/// Older documents miss `shortTitle` and sometimes `title`; the portal
/// renders both unconditionally. `shortTitle` always becomes the best
/// available label, `title` only when it is missing or empty.
fn apply_labels(mut resp: Value, _es_body: &Value) -> Value {
    if let Some(hits) = resp.pointer_mut("/hits/hits").and_then(Value::as_array_mut) {
        for hit in hits {
            let label = hit.get("_source").map(choose_label).unwrap_or_default();
            if let Some(source) = hit.get_mut("_source").and_then(Value::as_object_mut) {
                source.insert("shortTitle".to_string(), Value::String(label.clone()));
                let title_blank = match source.get("title") {
                    None | Some(Value::Null) => true,
                    Some(Value::String(title)) => title.is_empty(),
                    Some(_) => false,
                };
                if title_blank {
                    source.insert("title".to_string(), Value::String(label));
                }
            }
        }
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{state_with, StubBackend};
    use serde_json::json;

    fn two_groups() -> Value {
        json!({
            "took": 1,
            "timed_out": false,
            "hits": {"total": {"value": 2, "relation": "eq"}, "max_score": 1.0, "hits": [
                {"_id": "1", "_source": {"title": "Exome", "description": "Exome sequencing"}},
                {"_id": "2", "_source": {"code": "ont", "title": null}}
            ]}
        })
    }

    #[tokio::test]
    async fn short_titles_are_filled_from_the_best_label() {
        let (state, _backend) = state_with(StubBackend::ok().with_search_response(two_groups()));
        let Json(out) = search(State(state), Bytes::new()).await.unwrap();

        let hits = out["hits"]["hits"].as_array().unwrap();
        assert_eq!(hits[0]["_source"]["shortTitle"], json!("Exome sequencing"));
        // a present, non-empty title is kept
        assert_eq!(hits[0]["_source"]["title"], json!("Exome"));
        assert_eq!(hits[1]["_source"]["shortTitle"], json!("ont"));
        // a null title is replaced
        assert_eq!(hits[1]["_source"]["title"], json!("ont"));
    }

    #[tokio::test]
    async fn the_labelled_response_is_still_normalised() {
        let (state, _backend) = state_with(StubBackend::ok().with_search_response(two_groups()));
        let Json(out) = search(State(state), Bytes::new()).await.unwrap();
        assert_eq!(out["hits"]["total"], json!(2));
        assert_eq!(out["aggregations"], json!({}));
    }

    #[tokio::test]
    async fn non_string_titles_are_never_overwritten() {
        let resp = json!({"hits": {"hits": [
            {"_id": "7", "_source": {"code": "hic", "title": 7}}
        ]}});
        let (state, _backend) = state_with(StubBackend::ok().with_search_response(resp));
        let Json(out) = search(State(state), Bytes::new()).await.unwrap();

        let source = &out["hits"]["hits"][0]["_source"];
        assert_eq!(source["title"], json!(7));
        assert_eq!(source["shortTitle"], json!("hic"));
    }
}
