//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // RAG endpoint
        .route("/query", post(handlers::query))
        // Diagnostics
        .route("/metrics", get(handlers::metrics))
        .route("/metrics/reset", post(handlers::reset_metrics))
        .with_state(state)
}
