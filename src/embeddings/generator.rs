//! Embedding adapter used by the query pipeline

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::client::EmbeddingBackend;
use super::client::OpenAiEmbeddingClient;
use super::normalize_for_embedding;
use crate::config::AppConfig;
use crate::errors::RagError;
use crate::errors::Result;

/// Produces query vectors, shielding the pipeline from blank input and provider errors
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    model: String,
    dimension: usize,
}

impl EmbeddingService {
    /// Create an embedding service backed by the OpenAI client
    ///
    /// # Errors
    /// - Missing API key (`RagError::Config`)
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = OpenAiEmbeddingClient::new(
            &config.embeddings.endpoint,
            config.api_key(),
            config.request_timeout(),
        )?;
        info!(
            "Embedding service initialized with model: {}",
            config.embedding_model()
        );

        Ok(Self::with_backend(
            Arc::new(client),
            config.embedding_model(),
            config.embedding_dimension(),
        ))
    }

    /// Create from an arbitrary backend
    pub fn with_backend(
        backend: Arc<dyn EmbeddingBackend>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            dimension,
        }
    }

    /// Embed `text`.
    ///
    /// Blank input yields a zero vector of the configured dimension without
    /// contacting the provider. Provider failures surface as
    /// [`RagError::Retrieval`] and are not retried.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            warn!("Attempted to embed empty text, returning zero vector");
            return Ok(vec![0.0; self.dimension]);
        }

        let input = normalize_for_embedding(text);
        debug!("Generating embedding with model {}", self.model);

        let embedding = self
            .backend
            .embed(&self.model, &input)
            .await
            .map_err(RagError::retrieval)?;

        debug!("Embedding generated. Dimensions: {}", embedding.len());
        Ok(embedding)
    }
}
