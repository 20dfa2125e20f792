//! Route table and middleware.
//!
//! The paths are the portal's, kept verbatim so deployed frontends and
//! saved links keep working:
//!
//! - `GET  /` and `GET /beta/health`
//! - `POST /beta/{sample,population,superpopulation,data-collection,analysis-group,file}/_search`
//! - `POST /beta/{sample,population,file}/_search/:filename` (TSV export)
//! - `GET  /beta/sample/:name`, `GET /beta/population/:id`
//! - `POST /sitemap/_search`

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::endpoints::{
    analysis_group, data_collection, file, health, population, sample, sitemap, superpopulation,
};
use crate::state::AppState;

fn cors_layer(state: &AppState) -> CorsLayer {
    let cors = &state.settings.server.cors;
    if !cors.enabled {
        return CorsLayer::new();
    }
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if cors.origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = cors
        .origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn api_router(state: AppState) -> Router {
    let cors = cors_layer(&state);
    Router::new()
        .route("/", get(health::root))
        .route("/beta/health", get(health::health))
        .route("/beta/sample/_search", post(sample::search))
        .route("/beta/sample/_search/:filename", post(sample::export_tsv))
        .route("/beta/sample/:name", get(sample::detail))
        .route("/beta/population/_search", post(population::search))
        .route("/beta/population/_search/:filename", post(population::export_tsv))
        .route("/beta/population/:id", get(population::detail))
        .route("/beta/superpopulation/_search", post(superpopulation::search))
        .route("/beta/data-collection/_search", post(data_collection::search))
        .route("/beta/analysis-group/_search", post(analysis_group::search))
        .route("/beta/file/_search", post(file::search))
        .route("/beta/file/_search/:filename", post(file::export_tsv))
        .route("/sitemap/_search", post(sitemap::search))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
