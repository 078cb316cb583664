//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::metrics::PerformanceTracker;
use crate::rag::RagService;
use crate::Result;

/// Full application router: the API under `/api` plus middleware
pub fn build_app(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
///
/// Adapters are built once here, so configuration problems stop the
/// process before it accepts any request.
pub async fn serve_api(config: &AppConfig, host: &str, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting ragquery API server...");

    let tracker = Arc::new(PerformanceTracker::new());
    let rag = Arc::new(RagService::from_config(config, tracker.clone())?);
    let app = build_app(AppState { rag, tracker }, enable_cors);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health         - Health check");
    info!("  POST /api/query          - RAG query");
    info!("  GET  /api/metrics        - Stage timings");
    info!("  POST /api/metrics/reset  - Clear stage timings");

    axum::serve(listener, app).await?;

    Ok(())
}
