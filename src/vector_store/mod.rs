//! Vector store access
//!
//! Similarity search runs remotely through a Postgres function exposed by
//! Supabase's PostgREST RPC endpoint. [`VectorStore`] maps the raw match
//! list into [`RetrievedDocument`]s and reports every failure as a
//! connectivity problem, so callers can tell "store unreachable" apart from
//! "nothing relevant".

pub mod client;
pub mod store;

use async_trait::async_trait;
pub use client::SupabaseClient;
pub use client::SupabaseQueryLog;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
pub use store::VectorStore;

use crate::errors::Result;

/// A document fragment returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: Map<String, Value>,
    /// Provider-defined score, higher is more relevant
    pub similarity: f64,
}

/// Parameters of the remote match function
#[derive(Debug, Clone, Serialize)]
pub struct MatchRequest<'a> {
    pub query_embedding: &'a [f32],
    pub match_threshold: f32,
    pub match_count: usize,
}

/// One row as returned by the match function; every column may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub similarity: Option<f64>,
}

impl From<MatchRecord> for RetrievedDocument {
    fn from(record: MatchRecord) -> Self {
        Self {
            content: record.content.unwrap_or_default(),
            metadata: record.metadata.unwrap_or_default(),
            similarity: record.similarity.unwrap_or(0.0),
        }
    }
}

/// Remote similarity search
#[async_trait]
pub trait VectorStoreBackend: Send + Sync {
    async fn match_documents(&self, request: &MatchRequest<'_>) -> Result<Vec<MatchRecord>>;
}

/// Best-effort sink for answered queries
#[async_trait]
pub trait QueryLog: Send + Sync {
    async fn save_query(&self, query: &str, answer: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_columns_take_defaults() {
        let record: MatchRecord = serde_json::from_value(json!({})).unwrap();
        let doc = RetrievedDocument::from(record);

        assert_eq!(doc.content, "");
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.similarity, 0.0);
    }

    #[test]
    fn test_null_columns_take_defaults() {
        let record: MatchRecord = serde_json::from_value(json!({
            "content": "texto",
            "metadata": null,
            "similarity": null
        }))
        .unwrap();
        let doc = RetrievedDocument::from(record);

        assert_eq!(doc.content, "texto");
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.similarity, 0.0);
    }

    #[test]
    fn test_full_record_is_preserved() {
        let record: MatchRecord = serde_json::from_value(json!({
            "id": 42,
            "content": "El IVA general es del 21%.",
            "metadata": {"source": "impuestos.pdf", "chunk": 3},
            "similarity": 0.87
        }))
        .unwrap();
        let doc = RetrievedDocument::from(record);

        assert_eq!(doc.metadata["source"], "impuestos.pdf");
        assert_eq!(doc.metadata["chunk"], 3);
        assert!((doc.similarity - 0.87).abs() < 1e-12);
    }

    #[test]
    fn test_match_request_wire_format() {
        let embedding = [0.25_f32, -0.5];
        let request = MatchRequest {
            query_embedding: &embedding,
            match_threshold: 0.5,
            match_count: 5,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"query_embedding": [0.25, -0.5], "match_threshold": 0.5, "match_count": 5})
        );
    }
}
