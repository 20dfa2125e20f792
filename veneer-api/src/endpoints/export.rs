//! Shared TSV export plumbing
//!
//! The portal has delivered the export payload three different ways over
//! its lifetime: a raw JSON body, a urlencoded form with a `json` field,
//! and a multipart part named `json`. All three funnel into
//! [`ExportRequest`]. No payload at all is fine (export everything with
//! the resource's default columns); a payload that does not parse is the
//! caller's error.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use veneer::export::{clamp_size, render, ExportRequest};
use veneer::rewrite::RewriteChain;

use crate::error::ApiError;
use crate::state::AppState;

/// Export payload, extracted from whichever transport the portal used
#[derive(Debug)]
pub struct ExportPayload(pub Option<ExportRequest>);

#[derive(Deserialize)]
struct ExportForm {
    json: Option<String>,
}

fn parse_payload(raw: &str) -> Result<ExportRequest, ApiError> {
    serde_json::from_str(raw)
        .map_err(|err| ApiError::BadRequest(format!("invalid export payload: {err}")))
}

#[async_trait]
impl<S> FromRequest<S> for ExportPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|err| ApiError::BadRequest(format!("invalid multipart body: {err}")))?;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|err| ApiError::BadRequest(format!("invalid multipart body: {err}")))?
            {
                if field.name() == Some("json") {
                    let raw = field.text().await.map_err(|err| {
                        ApiError::BadRequest(format!("invalid multipart body: {err}"))
                    })?;
                    return Ok(ExportPayload(Some(parse_payload(&raw)?)));
                }
            }
            return Ok(ExportPayload(None));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<ExportForm>::from_request(req, state)
                .await
                .map_err(|err| ApiError::BadRequest(format!("invalid form body: {err}")))?;
            return match form.json {
                Some(raw) => Ok(ExportPayload(Some(parse_payload(&raw)?))),
                None => Ok(ExportPayload(None)),
            };
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| ApiError::BadRequest(format!("unreadable body: {err}")))?;
        if bytes.is_empty() {
            return Ok(ExportPayload(None));
        }
        serde_json::from_slice(&bytes)
            .map(|payload| ExportPayload(Some(payload)))
            .map_err(|err| ApiError::BadRequest(format!("invalid export payload: {err}")))
    }
}

/// Run the export search and assemble the TSV response.
///
/// The dispatched body projects `_source` down to the non-envelope columns
/// and clamps the size to the export cap. The rewrite chain is the
/// resource's own; gating does not apply to exports.
pub async fn run_export(
    state: &AppState,
    index: &str,
    filename: &str,
    ExportPayload(payload): ExportPayload,
    default_fields: &[&str],
    rewrite: RewriteChain,
) -> Result<Response, ApiError> {
    let payload = payload.unwrap_or_default();

    let columns: Vec<String> = match &payload.fields {
        Some(fields) if !fields.is_empty() => fields.clone(),
        _ => default_fields.iter().map(|field| field.to_string()).collect(),
    };

    let mut body = Map::new();
    body.insert(
        "query".to_string(),
        payload.query.clone().unwrap_or_else(|| json!({"match_all": {}})),
    );
    body.insert(
        "size".to_string(),
        json!(clamp_size(payload.size, state.settings.limits.export_size_cap)),
    );
    let source_fields: Vec<&String> = columns
        .iter()
        .filter(|column| column.as_str() != "_id" && column.as_str() != "_index")
        .collect();
    if source_fields.is_empty() {
        body.insert("_source".to_string(), json!(false));
    } else {
        body.insert("_source".to_string(), json!(source_fields));
    }

    let es_body = rewrite.apply(Value::Object(body));

    let resp = state.backend.search(index, &es_body, true).await?;
    let hits = resp
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    tracing::debug!(index, rows = hits.len(), "export assembled");

    let tsv = render(&hits, &columns, payload.column_names.as_deref(), ",");

    let stem = filename.trim_end_matches(".tsv");
    let disposition = format!("attachment; filename=\"{stem}.tsv\"");
    let headers = [
        ("Content-Type", "text/tab-separated-values; charset=utf-8"),
        ("Content-Disposition", disposition.as_str()),
        ("Cache-Control", "no-store"),
    ];
    Ok((headers, tsv).into_response())
}
