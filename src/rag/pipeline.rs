//! Complete RAG pipeline: Embed -> Retrieve -> Assemble -> Generate

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ContextAssembler;
use super::QueryOutcome;
use super::QueryResult;
use super::RagQuery;
use super::Stage;
use crate::config::AppConfig;
use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::RagError;
use crate::errors::Result;
use crate::llm::GenerationService;
use crate::metrics::PerformanceTracker;
use crate::vector_store::QueryLog;
use crate::vector_store::SupabaseClient;
use crate::vector_store::VectorStore;

/// Operation names recorded in the [`PerformanceTracker`]
pub const OP_EMBEDDING: &str = "generate_query_embedding";
pub const OP_RETRIEVAL: &str = "retrieve_documents";
pub const OP_CONTEXT: &str = "prepare_context";
pub const OP_GENERATION: &str = "generate_response";
pub const OP_SAVE_QUERY: &str = "save_query";
pub const OP_QUERY: &str = "rag_query";

/// Complete RAG service
pub struct RagService {
    embeddings: EmbeddingService,
    vector_store: VectorStore,
    generator: GenerationService,
    context_assembler: ContextAssembler,
    query_log: Option<Arc<dyn QueryLog>>,
    tracker: Arc<PerformanceTracker>,
    defaults: RetrievalConfig,
}

impl RagService {
    /// Build every adapter from configuration.
    ///
    /// # Errors
    /// - Missing provider API key or Supabase credentials (`RagError::Config`)
    /// - HTTP client build errors
    pub fn from_config(config: &AppConfig, tracker: Arc<PerformanceTracker>) -> Result<Self> {
        let embeddings = EmbeddingService::new(config)?;
        let generator = GenerationService::new(config)?;

        let supabase = SupabaseClient::new(config)?;
        let query_log = config
            .vector_store
            .query_log_table
            .as_deref()
            .map(|table| Arc::new(supabase.query_log(table)) as Arc<dyn QueryLog>);
        let vector_store = VectorStore::with_backend(
            Arc::new(supabase),
            config.vector_store.collection_name.clone(),
        );

        let mut service = Self::from_services(embeddings, vector_store, generator, tracker)
            .with_defaults(config.retrieval.clone());
        service.query_log = query_log;
        Ok(service)
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        embeddings: EmbeddingService,
        vector_store: VectorStore,
        generator: GenerationService,
        tracker: Arc<PerformanceTracker>,
    ) -> Self {
        Self {
            embeddings,
            vector_store,
            generator,
            context_assembler: ContextAssembler::new(),
            query_log: None,
            tracker,
            defaults: RetrievalConfig::default(),
        }
    }

    /// Persist answered queries through `query_log`
    #[must_use]
    pub fn with_query_log(mut self, query_log: Arc<dyn QueryLog>) -> Self {
        self.query_log = Some(query_log);
        self
    }

    /// Threshold and source limit used when the caller gives none
    #[must_use]
    pub fn with_defaults(mut self, defaults: RetrievalConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Start a query with the configured defaults
    pub fn new_query(&self, text: impl Into<String>) -> RagQuery {
        RagQuery::with_defaults(text, &self.defaults)
    }

    /// Validate `text` and run it through the pipeline.
    ///
    /// Only invalid input is reported as an error; pipeline failures are
    /// described inside the returned [`QueryResult`].
    pub async fn ask(&self, text: &str) -> Result<QueryResult> {
        let query = self.new_query(text);
        query.validate()?;
        Ok(self.query(&query).await)
    }

    /// Run a query. Never fails: stage errors and panics become an
    /// error-describing [`QueryResult`].
    pub async fn query(&self, query: &RagQuery) -> QueryResult {
        let started = Instant::now();
        let _timer = self.tracker.track(OP_QUERY);
        info!("Processing RAG query: {}", query.text);

        let outcome = AssertUnwindSafe(self.execute(query, started))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| QueryOutcome::StageFailure {
                stage: Stage::Pipeline,
                cause: RagError::Internal(panic_message(panic.as_ref())),
            });

        if let QueryOutcome::StageFailure { stage, cause } = &outcome {
            error!("RAG query failed at {} stage: {}", stage, cause);
        }

        outcome.into_result(started.elapsed())
    }

    /// Run the pipeline and report which stage failed, if any
    pub async fn execute(&self, query: &RagQuery, started: Instant) -> QueryOutcome {
        match self.run(query, started).await {
            Ok(result) => QueryOutcome::Success(result),
            Err((stage, cause)) => QueryOutcome::StageFailure { stage, cause },
        }
    }

    async fn run(
        &self,
        query: &RagQuery,
        started: Instant,
    ) -> std::result::Result<QueryResult, (Stage, RagError)> {
        debug!("Step 1: Generating query embedding");
        let embedding = {
            let _timer = self.tracker.track(OP_EMBEDDING);
            self.embeddings
                .embed(&query.text)
                .await
                .map_err(|e| (Stage::Embedding, e))?
        };

        debug!("Step 2: Retrieving documents");
        let documents = {
            let _timer = self.tracker.track(OP_RETRIEVAL);
            self.vector_store
                .similarity_search(&embedding, query.similarity_threshold, query.max_sources)
                .await
                .map_err(|e| (Stage::Retrieval, e))?
        };

        if documents.is_empty() {
            info!("No relevant documents found for the query");
            return Ok(QueryResult::no_matches(started.elapsed()));
        }
        debug!("Retrieved {} documents", documents.len());

        debug!("Step 3: Assembling context");
        let context = {
            let _timer = self.tracker.track(OP_CONTEXT);
            self.context_assembler.assemble(&documents)
        };

        debug!("Step 4: Generating answer");
        let answer = {
            let _timer = self.tracker.track(OP_GENERATION);
            let answer = self
                .generator
                .generate(&context, &query.text)
                .await
                .map_err(|e| (Stage::Generation, e))?;
            if answer.trim().is_empty() {
                return Err((
                    Stage::Generation,
                    RagError::generation(RagError::MalformedResponse(
                        "Model returned an empty answer".to_string(),
                    )),
                ));
            }
            answer
        };

        if let Err(e) = self.save_query(&query.text, &answer).await {
            warn!("Error saving query: {}", e);
        }

        info!("RAG query completed successfully");
        Ok(QueryResult::answered(answer, documents, started.elapsed()))
    }

    /// Best-effort persistence of an answered query; a no-op without a query log
    pub async fn save_query(&self, query: &str, answer: &str) -> Result<()> {
        let Some(query_log) = &self.query_log else {
            return Ok(());
        };
        let _timer = self.tracker.track(OP_SAVE_QUERY);
        query_log.save_query(query, answer).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Unexpected failure: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Unexpected failure: {message}")
    } else {
        "Unexpected failure".to_string()
    }
}
