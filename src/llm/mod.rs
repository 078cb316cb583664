//! Answer generation with a chat model

pub mod client;
pub mod prompts;

use std::sync::Arc;

pub use client::ChatBackend;
pub use client::ChatMessage;
pub use client::ChatRequest;
pub use client::OpenAiChatClient;
pub use prompts::PromptTemplate;
pub use prompts::INSUFFICIENT_INFORMATION;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::RagError;
use crate::errors::Result;

/// Sampling temperature for grounded answers
pub const GENERATION_TEMPERATURE: f32 = 0.1;

/// Renders the grounded-answer prompt and asks the chat model for an answer
pub struct GenerationService {
    backend: Arc<dyn ChatBackend>,
    model: String,
    template: PromptTemplate,
}

impl GenerationService {
    /// Create a generation service backed by the OpenAI client
    ///
    /// # Errors
    /// - Missing API key (`RagError::Config`)
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = OpenAiChatClient::new(
            &config.llm.endpoint,
            config.api_key(),
            config.request_timeout(),
        )?;
        info!("Generation service initialized with model: {}", config.llm_model());

        Ok(Self::with_backend(Arc::new(client), config.llm_model()))
    }

    pub fn with_backend(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            template: prompts::grounded_answer(),
        }
    }

    /// Answer `question` using only `context`.
    ///
    /// Provider failures surface as [`RagError::Generation`] and are not retried.
    pub async fn generate(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self
            .template
            .render(&[("context", context), ("question", question)])
            .map_err(RagError::generation)?;

        let request = ChatRequest {
            model: &self.model,
            temperature: GENERATION_TEMPERATURE,
            messages: vec![ChatMessage::user(prompt)],
        };

        debug!("Generating answer with model {}", self.model);
        self.backend
            .complete(&request)
            .await
            .map_err(RagError::generation)
    }
}
