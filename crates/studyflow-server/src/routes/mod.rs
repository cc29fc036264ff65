//! Route table and liveness probe.

pub mod fetch;
pub mod oauth;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Builds the application router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/auth/google/start", post(oauth::start))
        .route("/auth/google/callback", get(oauth::callback))
        .route("/connections/{provider}", delete(oauth::disconnect))
        .route("/fetch/gmail", get(fetch::gmail))
        .route("/fetch/classroom", get(fetch::classroom))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
