//! Error mapping for the legacy API surface
//!
//! The portal parses error bodies, so the shapes are contractual: upstream
//! trouble is always the same generic 502, a lookup that finds nothing is
//! a 404 naming the resource, a bad payload is a 400 with the reason.
//! Backend detail goes to the log, never into a body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Carries the internal detail for logging; clients see only
    /// "backend_unavailable"
    #[error("backend_unavailable")]
    Upstream(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal_server_error")]
    Internal(String),
}

impl From<veneer::Error> for ApiError {
    fn from(err: veneer::Error) -> Self {
        match err {
            veneer::Error::Upstream(detail) => ApiError::Upstream(detail),
            veneer::Error::NotFound(resource) => ApiError::NotFound(resource),
            veneer::Error::BadExport(reason) => ApiError::BadRequest(reason),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Upstream(detail) => {
                tracing::warn!(detail = %detail, "upstream failure, answering backend_unavailable");
                json!({"detail": "backend_unavailable"})
            }
            Self::NotFound(resource) => json!({"detail": format!("{resource} not found")}),
            Self::BadRequest(reason) => json!({"detail": reason}),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "unexpected internal error");
                json!({"error": "internal_server_error"})
            }
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upstream_detail_never_reaches_the_body() {
        let resp = ApiError::Upstream("es-prod-3:9200 connection refused".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await, json!({"detail": "backend_unavailable"}));
    }

    #[tokio::test]
    async fn not_found_names_the_resource() {
        let resp = ApiError::NotFound("Sample".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({"detail": "Sample not found"}));
    }

    #[tokio::test]
    async fn bad_request_carries_the_reason() {
        let resp = ApiError::BadRequest("invalid export payload: expected value".to_string())
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"detail": "invalid export payload: expected value"})
        );
    }

    #[tokio::test]
    async fn internal_errors_use_the_catch_all_shape() {
        let resp = ApiError::Internal("json: EOF".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({"error": "internal_server_error"}));
    }

    #[test]
    fn core_errors_map_onto_api_errors() {
        match ApiError::from(veneer::Error::Upstream("x".to_string())) {
            ApiError::Upstream(_) => {}
            other => panic!("Expected Upstream, got {other:?}"),
        }
        match ApiError::from(veneer::Error::NotFound("Population".to_string())) {
            ApiError::NotFound(resource) => assert_eq!(resource, "Population"),
            other => panic!("Expected NotFound, got {other:?}"),
        }
        match ApiError::from(veneer::Error::BadExport("bad fields".to_string())) {
            ApiError::BadRequest(_) => {}
            other => panic!("Expected BadRequest, got {other:?}"),
        }
        match ApiError::from(veneer::Error::Config("oops".to_string())) {
            ApiError::Internal(_) => {}
            other => panic!("Expected Internal, got {other:?}"),
        }
    }
}
