//! API request and response types

use serde::Deserialize;
use serde::Serialize;

/// Message returned for blank queries
pub const EMPTY_QUERY_MESSAGE: &str = "La consulta está vacía";

/// Body of `POST /api/query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Missing, `null` and blank all count as an empty query
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
    #[serde(default)]
    pub max_sources: Option<usize>,
}

/// Client error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
