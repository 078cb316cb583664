//! Embedding API clients

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::RagError;
use crate::errors::Result;

/// A remote service that turns one piece of text into a vector
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>>;
}

/// Client for the OpenAI `/embeddings` API (or any compatible server)
pub struct OpenAiEmbeddingClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl OpenAiEmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - Missing API key
    /// - HTTP client build errors
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RagError::Config("OpenAI API key not provided for embeddings".to_string())
            })?
            .to_string();

        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbeddingClient {
    async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a str,
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&OpenAIRequest { input, model })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::Provider {
                provider: "OpenAI",
                status,
                body,
            });
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| RagError::MalformedResponse(format!("embeddings: {e}")))?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::MalformedResponse("No embedding in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = OpenAiEmbeddingClient::new(
            "https://api.openai.com/v1",
            None,
            Duration::from_secs(5),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RagError::Config(_)));

        let err = OpenAiEmbeddingClient::new(
            "https://api.openai.com/v1",
            Some("  "),
            Duration::from_secs(5),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_openai_embedding() {
        let key = std::env::var("OPENAI_API_KEY").ok();
        let client = OpenAiEmbeddingClient::new(
            "https://api.openai.com/v1",
            key.as_deref(),
            Duration::from_secs(30),
        )
        .unwrap();

        let embedding = client
            .embed("text-embedding-3-small", "Hello, world!")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 1536);
    }
}
