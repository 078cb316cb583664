//! RAG (Retrieval-Augmented Generation) module
//!
//! This module answers questions from the document store:
//! - Query embedding
//! - Similarity search with a threshold and a source limit
//! - Context assembly from retrieved documents
//! - Grounded answer generation
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ragquery::config::AppConfig;
//! use ragquery::metrics::PerformanceTracker;
//! use ragquery::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::from_config(&config, Arc::new(PerformanceTracker::new()))?;
//!
//!     let result = service.ask("¿Cuál es el plazo de entrega?").await?;
//!     println!("Answer: {}", result.answer);
//!     println!("Sources: {}", result.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;

use std::error::Error;
use std::fmt;
use std::time::Duration;

pub use context::ContextAssembler;
pub use pipeline::RagService;
use serde::Deserialize;
use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::errors::RagError;
use crate::errors::Result;
pub use crate::vector_store::RetrievedDocument;

/// Default similarity threshold passed to the match function
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.1;

/// Default number of documents to retrieve
pub const DEFAULT_MAX_SOURCES: usize = 5;

/// Answer given when the store has nothing relevant
pub const NO_RELEVANT_INFORMATION: &str = "No encontré información relevante para responder a tu pregunta. Por favor, intenta reformularla o consulta sobre otro tema.";

/// Prefix of the answer given when a stage fails
pub const ERROR_ANSWER_PREFIX: &str = "Lo siento, ha ocurrido un error al procesar tu consulta: ";

/// A question plus its retrieval parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RagQuery {
    pub text: String,
    pub similarity_threshold: f32,
    pub max_sources: usize,
}

impl RagQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_sources: DEFAULT_MAX_SOURCES,
        }
    }

    /// Build a query using configured defaults
    pub fn with_defaults(text: impl Into<String>, defaults: &RetrievalConfig) -> Self {
        Self {
            text: text.into(),
            similarity_threshold: defaults.similarity_threshold,
            max_sources: defaults.max_sources,
        }
    }

    #[must_use]
    pub const fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Reject input the pipeline should never see
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(RagError::EmptyInput);
        }
        if self.max_sources == 0 {
            return Err(RagError::InvalidQuery(
                "max_sources must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::InvalidQuery(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Pipeline step with its own failure domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Embedding,
    Retrieval,
    Generation,
    /// Failure outside any single stage, such as a panic
    Pipeline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Embedding => "embedding",
            Self::Retrieval => "retrieval",
            Self::Generation => "generation",
            Self::Pipeline => "pipeline",
        };
        f.write_str(name)
    }
}

impl Stage {
    /// Wording shown to the user after [`ERROR_ANSWER_PREFIX`]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Embedding => "no se pudo procesar la pregunta.",
            Self::Retrieval => "no se pudieron buscar documentos en la base de conocimiento.",
            Self::Generation => "no se pudo generar la respuesta.",
            Self::Pipeline => "se produjo un fallo inesperado.",
        }
    }
}

/// Timing and diagnostics attached to every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Seconds from the start of the query until the result was built
    pub query_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_retrieved: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
}

/// Final answer of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<RetrievedDocument>,
    pub metadata: QueryMetadata,
}

impl QueryResult {
    pub(crate) fn answered(
        answer: String,
        sources: Vec<RetrievedDocument>,
        elapsed: Duration,
    ) -> Self {
        let documents_retrieved = sources.len();
        Self {
            answer,
            sources,
            metadata: QueryMetadata {
                query_time: elapsed.as_secs_f64(),
                documents_retrieved: Some(documents_retrieved),
                error: None,
                error_stack: None,
                failed_stage: None,
            },
        }
    }

    pub(crate) fn no_matches(elapsed: Duration) -> Self {
        Self::answered(NO_RELEVANT_INFORMATION.to_string(), Vec::new(), elapsed)
    }

    pub(crate) fn failed(stage: Stage, cause: &RagError, elapsed: Duration) -> Self {
        Self {
            answer: format!("{ERROR_ANSWER_PREFIX}{}", stage.user_message()),
            sources: Vec::new(),
            metadata: QueryMetadata {
                query_time: elapsed.as_secs_f64(),
                documents_retrieved: None,
                error: Some(cause.to_string()),
                error_stack: Some(render_error_stack(stage, cause)),
                failed_stage: Some(stage),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.metadata.error.is_some()
    }

    /// Human-readable rendering for terminals
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Answer:\n{}\n\n", self.answer));

        if let Some(error) = &self.metadata.error {
            output.push_str(&format!("Error: {error}\n"));
        }

        output.push_str(&format!("Sources ({}):\n", self.sources.len()));
        for (idx, source) in self.sources.iter().enumerate() {
            let origin = source
                .metadata
                .get("source")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            output.push_str(&format!(
                "  {}. {} (Similarity: {:.2})\n",
                idx + 1,
                origin,
                source.similarity
            ));
        }

        output.push_str(&format!("\nQuery time: {:.3}s\n", self.metadata.query_time));
        output
    }
}

/// Internal result of the pipeline, before conversion to the uniform shape
#[derive(Debug)]
pub enum QueryOutcome {
    Success(QueryResult),
    StageFailure { stage: Stage, cause: RagError },
}

impl QueryOutcome {
    /// Convert to the caller-facing result; `elapsed` is used for failures
    pub fn into_result(self, elapsed: Duration) -> QueryResult {
        match self {
            Self::Success(result) => result,
            Self::StageFailure { stage, cause } => QueryResult::failed(stage, &cause, elapsed),
        }
    }
}

/// Failed stage followed by the cause chain, one error per line
fn render_error_stack(stage: Stage, cause: &RagError) -> String {
    let mut lines = vec![format!("stage: {stage}"), cause.to_string()];
    let mut source = cause.source();
    while let Some(err) = source {
        lines.push(format!("caused by: {err}"));
        source = err.source();
    }
    lines.join("\n")
}
