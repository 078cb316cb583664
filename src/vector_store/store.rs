//! Similarity search adapter

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::MatchRequest;
use super::RetrievedDocument;
use super::VectorStoreBackend;
use crate::errors::RagError;
use crate::errors::Result;

pub struct VectorStore {
    backend: Arc<dyn VectorStoreBackend>,
    collection_name: String,
}

impl VectorStore {
    pub fn with_backend(
        backend: Arc<dyn VectorStoreBackend>,
        collection_name: impl Into<String>,
    ) -> Self {
        let collection_name = collection_name.into();
        info!("Vector store initialized with collection: {}", collection_name);
        Self {
            backend,
            collection_name,
        }
    }

    /// Find up to `max_documents` documents matching `query_embedding`.
    ///
    /// Results keep the order returned by the store. An empty result is not
    /// an error; any transport or decoding failure is reported as
    /// [`RagError::Connectivity`].
    pub async fn similarity_search(
        &self,
        query_embedding: &[f32],
        similarity_threshold: f32,
        max_documents: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        let request = MatchRequest {
            query_embedding,
            match_threshold: similarity_threshold,
            match_count: max_documents,
        };

        let records = self
            .backend
            .match_documents(&request)
            .await
            .map_err(RagError::connectivity)?;

        if records.is_empty() {
            info!("No documents matched the query");
            return Ok(Vec::new());
        }

        debug!(
            "Matched {} documents in collection {}",
            records.len(),
            self.collection_name
        );
        Ok(records.into_iter().map(RetrievedDocument::from).collect())
    }
}
