//! Query embedding generation
//!
//! [`EmbeddingService`] is the adapter the pipeline talks to. It owns the
//! empty-input fallback and text normalization, and delegates the remote
//! call to an [`EmbeddingBackend`] (OpenAI-compatible by default).
//!
//! # Examples
//!
//! ```rust,no_run
//! use ragquery::embeddings::EmbeddingService;
//! use ragquery::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("¿Qué es un vector?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;

pub use client::EmbeddingBackend;
pub use client::OpenAiEmbeddingClient;
pub use generator::EmbeddingService;

/// Default embedding dimension for text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Collapse line breaks into spaces and trim, as the provider expects single-line input
pub fn normalize_for_embedding(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
