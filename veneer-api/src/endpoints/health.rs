//! Liveness and upstream health

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /` - process liveness, no backend involved
pub async fn root() -> Json<Value> {
    Json(json!({"ok": true}))
}

/// `GET /beta/health` - "ok" only when the cluster answers a ping
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let status = if state.backend.ping().await { "ok" } else { "degraded" };
    Json(json!({"status": status}))
}
