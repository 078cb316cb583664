//! In-memory backends for unit tests

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::embeddings::EmbeddingBackend;
use crate::errors::RagError;
use crate::errors::Result;
use crate::llm::ChatBackend;
use crate::llm::ChatMessage;
use crate::llm::ChatRequest;
use crate::vector_store::MatchRecord;
use crate::vector_store::MatchRequest;
use crate::vector_store::QueryLog;
use crate::vector_store::VectorStoreBackend;

/// A match row with `source` metadata
pub fn record(content: &str, similarity: f64) -> MatchRecord {
    let mut metadata = Map::new();
    metadata.insert("source".to_string(), Value::String(format!("{content}.txt")));
    MatchRecord {
        content: Some(content.to_string()),
        metadata: Some(metadata),
        similarity: Some(similarity),
    }
}

pub struct StubEmbeddings {
    result: std::result::Result<Vec<f32>, String>,
    pub calls: AtomicUsize,
    pub last_input: Mutex<Option<String>>,
    pub last_model: Mutex<Option<String>>,
}

impl StubEmbeddings {
    pub fn returning(vector: Vec<f32>) -> Self {
        Self::with_result(Ok(vector))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(result: std::result::Result<Vec<f32>, String>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
            last_model: Mutex::new(None),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for StubEmbeddings {
    async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(input.to_string());
        *self.last_model.lock().unwrap() = Some(model.to_string());
        self.result.clone().map_err(RagError::Internal)
    }
}

pub struct StubVectorStore {
    result: std::result::Result<Vec<MatchRecord>, String>,
    pub calls: AtomicUsize,
    /// (query_embedding, match_threshold, match_count)
    pub last_request: Mutex<Option<(Vec<f32>, f32, usize)>>,
}

impl StubVectorStore {
    pub fn returning(records: Vec<MatchRecord>) -> Self {
        Self::with_result(Ok(records))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(result: std::result::Result<Vec<MatchRecord>, String>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl VectorStoreBackend for StubVectorStore {
    async fn match_documents(&self, request: &MatchRequest<'_>) -> Result<Vec<MatchRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((
            request.query_embedding.to_vec(),
            request.match_threshold,
            request.match_count,
        ));
        self.result.clone().map_err(RagError::Internal)
    }
}

/// Owned copy of a [`ChatRequest`]
#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

pub struct StubChat {
    result: std::result::Result<String, String>,
    panic: bool,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<RecordedChat>>,
}

impl StubChat {
    pub fn answering(answer: &str) -> Self {
        Self::with_result(Ok(answer.to_string()), false)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()), false)
    }

    pub fn panicking() -> Self {
        Self::with_result(Ok(String::new()), true)
    }

    fn with_result(result: std::result::Result<String, String>, panic: bool) -> Self {
        Self {
            result,
            panic,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ChatBackend for StubChat {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(RecordedChat {
            model: request.model.to_string(),
            temperature: request.temperature,
            messages: request.messages.clone(),
        });
        assert!(!self.panic, "chat backend exploded");
        self.result.clone().map_err(RagError::Internal)
    }
}

pub struct StubQueryLog {
    fail: bool,
    pub saved: Mutex<Vec<(String, String)>>,
}

impl StubQueryLog {
    pub fn accepting() -> Self {
        Self {
            fail: false,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            saved: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryLog for StubQueryLog {
    async fn save_query(&self, query: &str, answer: &str) -> Result<()> {
        if self.fail {
            return Err(RagError::Internal("query log unavailable".to_string()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((query.to_string(), answer.to_string()));
        Ok(())
    }
}
