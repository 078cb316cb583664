pub mod api;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::AppConfig;
pub use errors::*;
pub use rag::QueryResult;
pub use rag::RagQuery;
pub use rag::RagService;
