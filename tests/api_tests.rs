mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use common::Behavior;
use common::FakeProviders;
use ragquery::api::build_app;
use ragquery::api::types::EMPTY_QUERY_MESSAGE;
use ragquery::api::AppState;
use ragquery::metrics::PerformanceTracker;
use ragquery::RagService;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

async fn app(providers: &FakeProviders) -> Router {
    let tracker = Arc::new(PerformanceTracker::new());
    let rag = Arc::new(RagService::from_config(&providers.config(), tracker.clone()).unwrap());
    build_app(AppState { rag, tracker }, false)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(app(&providers).await, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn query_returns_answer_and_sources() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(
        app(&providers).await,
        post_json("/api/query", r#"{"query": "¿Qué dice A?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], json!("Respuesta basada en los documentos."));
    assert_eq!(body["sources"].as_array().unwrap().len(), 3);
    assert_eq!(body["sources"][1]["content"], json!("B"));
    assert_eq!(body["metadata"]["documents_retrieved"], json!(3));
    assert!(body["metadata"].get("error").is_none());
}

#[tokio::test]
async fn query_overrides_are_forwarded() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, _) = send(
        app(&providers).await,
        post_json(
            "/api/query",
            r#"{"query": "pregunta", "similarity_threshold": 0.5, "max_sources": 1}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    providers.recorded(|r| {
        assert_eq!(r.match_requests[0]["match_count"], json!(1));
        assert!((r.match_requests[0]["match_threshold"].as_f64().unwrap() - 0.5).abs() < 1e-6);
    });
}

#[tokio::test]
async fn blank_query_is_a_bad_request() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(
        app(&providers).await,
        post_json("/api/query", r#"{"query": "   "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!(EMPTY_QUERY_MESSAGE));
    providers.recorded(|r| assert!(r.embedding_requests.is_empty()));
}

#[tokio::test]
async fn missing_query_field_is_a_bad_request() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(app(&providers).await, post_json("/api/query", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!(EMPTY_QUERY_MESSAGE));
}

#[tokio::test]
async fn null_query_is_reported_as_empty() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(
        app(&providers).await,
        post_json("/api/query", r#"{"query": null}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": EMPTY_QUERY_MESSAGE}));
    providers.recorded(|r| assert!(r.embedding_requests.is_empty()));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(app(&providers).await, post_json("/api/query", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn zero_max_sources_is_a_bad_request() {
    let providers = FakeProviders::start(Behavior::default()).await;

    let (status, body) = send(
        app(&providers).await,
        post_json("/api/query", r#"{"query": "pregunta", "max_sources": 0}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query"));
}

#[tokio::test]
async fn pipeline_failure_still_answers_ok() {
    let providers = FakeProviders::start(Behavior {
        match_status: StatusCode::SERVICE_UNAVAILABLE,
        ..Behavior::default()
    })
    .await;

    let (status, body) = send(
        app(&providers).await,
        post_json("/api/query", r#"{"query": "pregunta"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["failed_stage"], json!("retrieval"));
    assert!(body["metadata"]["error"].as_str().unwrap().contains("503"));
    assert_eq!(body["sources"], json!([]));
}

#[tokio::test]
async fn metrics_track_and_reset() {
    let providers = FakeProviders::start(Behavior::default()).await;
    let app = app(&providers).await;

    send(app.clone(), post_json("/api/query", r#"{"query": "pregunta"}"#)).await;

    let (status, body) = send(app.clone(), get("/api/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rag_query"]["count"], json!(1));
    assert_eq!(body["generate_query_embedding"]["count"], json!(1));
    assert!(body["rag_query"]["average_time"].as_f64().unwrap() >= 0.0);

    let (status, _) = send(app.clone(), post_json("/api/metrics/reset", "")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(app, get("/api/metrics")).await;
    assert_eq!(body, json!({}));
}
