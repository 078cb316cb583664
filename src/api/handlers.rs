//! API request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::types::*;
use crate::errors::RagError;
use crate::metrics::OperationMetrics;
use crate::metrics::PerformanceTracker;
use crate::rag::QueryResult;
use crate::rag::RagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagService>,
    pub tracker: Arc<PerformanceTracker>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn validation_error(error: &RagError) -> ApiError {
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let message = match error {
        RagError::EmptyInput => EMPTY_QUERY_MESSAGE.to_string(),
        other => other.to_string(),
    };
    (status, Json(ErrorResponse::new(message)))
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Answer a question.
///
/// Pipeline failures still answer 200 with diagnostics in `metadata`; only
/// unusable input is a 400.
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Rejected query body: {}", rejection);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(rejection.body_text())),
        )
    })?;

    let mut rag_query = state.rag.new_query(req.query.unwrap_or_default());
    if let Some(threshold) = req.similarity_threshold {
        rag_query = rag_query.with_similarity_threshold(threshold);
    }
    if let Some(max_sources) = req.max_sources {
        rag_query = rag_query.with_max_sources(max_sources);
    }
    rag_query.validate().map_err(|e| validation_error(&e))?;

    let span = info_span!("query", request_id = %Uuid::new_v4());
    let result = async {
        info!("POST /api/query: {}", rag_query.text);
        state.rag.query(&rag_query).await
    }
    .instrument(span)
    .await;

    Ok(Json(result))
}

/// Aggregated stage timings
pub async fn metrics(State(state): State<AppState>) -> Json<BTreeMap<String, OperationMetrics>> {
    Json(state.tracker.metrics())
}

/// Clear recorded timings
pub async fn reset_metrics(State(state): State<AppState>) -> StatusCode {
    info!("POST /api/metrics/reset");
    state.tracker.reset();
    StatusCode::NO_CONTENT
}
