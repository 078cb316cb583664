//! In-process stand-in for the OpenAI and Supabase HTTP APIs

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use ragquery::config::AppConfig;
use serde_json::json;
use serde_json::Value;

pub const API_KEY: &str = "sk-test";
pub const SUPABASE_KEY: &str = "service-key";
pub const QUERY_LOG_TABLE: &str = "query_logs";

#[derive(Default)]
pub struct Recorded {
    pub embedding_requests: Vec<Value>,
    pub chat_requests: Vec<Value>,
    pub match_requests: Vec<Value>,
    pub match_api_keys: Vec<String>,
    pub saved_queries: Vec<Value>,
}

pub struct Behavior {
    pub matches: Value,
    pub match_status: StatusCode,
    pub answer: String,
    pub chat_status: StatusCode,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            matches: json!([
                {"content": "A", "metadata": {"source": "a.txt"}, "similarity": 0.92},
                {"content": "B", "metadata": {"source": "b.txt"}, "similarity": 0.81},
                {"content": "C", "metadata": {"source": "c.txt"}, "similarity": 0.40}
            ]),
            match_status: StatusCode::OK,
            answer: "Respuesta basada en los documentos.".to_string(),
            chat_status: StatusCode::OK,
        }
    }
}

#[derive(Clone)]
struct FakeState {
    behavior: Arc<Behavior>,
    recorded: Arc<Mutex<Recorded>>,
}

pub struct FakeProviders {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeProviders {
    pub async fn start(behavior: Behavior) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = FakeState {
            behavior: Arc::new(behavior),
            recorded: recorded.clone(),
        };

        let app = Router::new()
            .route("/v1/embeddings", post(embeddings))
            .route("/v1/chat/completions", post(chat))
            .route("/rest/v1/rpc/match_documents", post(match_documents))
            .route(&format!("/rest/v1/{QUERY_LOG_TABLE}"), post(insert_query))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, recorded }
    }

    /// Configuration pointing every adapter at this server
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.embeddings.endpoint = format!("http://{}/v1", self.addr);
        config.llm.endpoint = format!("http://{}/v1", self.addr);
        config.llm.api_key = Some(API_KEY.to_string());
        config.vector_store.url = Some(format!("http://{}/", self.addr));
        config.vector_store.key = Some(SUPABASE_KEY.to_string());
        config.http.request_timeout_secs = 5;
        config
    }

    pub fn recorded<T>(&self, f: impl FnOnce(&Recorded) -> T) -> T {
        f(&self.recorded.lock().unwrap())
    }
}

async fn embeddings(State(state): State<FakeState>, Json(body): Json<Value>) -> Json<Value> {
    state.recorded.lock().unwrap().embedding_requests.push(body);
    Json(json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]}))
}

async fn chat(
    State(state): State<FakeState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.recorded.lock().unwrap().chat_requests.push(body);
    if !state.behavior.chat_status.is_success() {
        return (
            state.behavior.chat_status,
            Json(json!({"error": {"message": "rate limited"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"choices": [{"message": {"role": "assistant", "content": state.behavior.answer}}]})),
    )
}

async fn match_documents(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.match_requests.push(body);
        if let Some(key) = headers.get("apikey").and_then(|v| v.to_str().ok()) {
            recorded.match_api_keys.push(key.to_string());
        }
    }
    if !state.behavior.match_status.is_success() {
        return (
            state.behavior.match_status,
            Json(json!({"message": "database unavailable"})),
        );
    }
    (StatusCode::OK, Json(state.behavior.matches.clone()))
}

async fn insert_query(State(state): State<FakeState>, Json(body): Json<Value>) -> StatusCode {
    state.recorded.lock().unwrap().saved_queries.push(body);
    StatusCode::CREATED
}
