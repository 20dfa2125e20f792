//! Handlers for the legacy API surface
//!
//! One module per resource. The rewrite chains differ between resources,
//! including their order, because that is the behaviour the portal was
//! built against.

pub mod analysis_group;
pub mod data_collection;
pub mod export;
pub mod file;
pub mod health;
pub mod population;
pub mod sample;
pub mod sitemap;
pub mod superpopulation;

use axum::body::Bytes;
use serde_json::Value;

use crate::error::ApiError;

/// Search bodies are optional: absent or empty means match-everything.
/// A present but unparseable body is the caller's error.
pub(crate) fn parse_optional_body(bytes: &Bytes) -> Result<Option<Value>, ApiError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|err| ApiError::BadRequest(format!("invalid JSON body: {err}")))
}
