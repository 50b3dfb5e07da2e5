use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use bedrock_rag::{build_router, handle_proxy_event, AppState};
use rag_ai::embeddings::Embedder;
use rag_ai::llm::Generator;
use rag_ai::rag::{AnswerOptions, RagPipeline};
use rag_ai::search::Searcher;
use rag_core::domain::{Document, SearchResult};
use rag_core::error::AppError;

struct FixedEmbedder;

impl Embedder for FixedEmbedder {
    fn embed(&self, _input: &str) -> Result<Vec<f32>, AppError> {
        Ok(vec![0.1, 0.2])
    }
}

struct FixedSearcher(Vec<SearchResult>);

impl Searcher for FixedSearcher {
    fn search(&self, _vector: &[f32], _limit: usize) -> Result<Vec<SearchResult>, AppError> {
        Ok(self.0.clone())
    }
}

struct FixedGenerator(Result<String, AppError>);

impl Generator for FixedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        self.0.clone()
    }
}

fn pipeline(generated: Result<String, AppError>) -> RagPipeline {
    RagPipeline::new(
        Box::new(FixedEmbedder),
        Box::new(FixedSearcher(vec![SearchResult {
            document: Document::new("doc1", "Bedrock is a managed service..."),
            score: 0.8,
        }])),
        Box::new(FixedGenerator(generated)),
        AnswerOptions::default(),
    )
}

fn app(generated: Result<String, AppError>) -> Router {
    build_router(AppState::new(pipeline(generated)))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.expect("request success");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

fn post_rag(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rag")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn rag_route_returns_grounded_answer() {
    let (status, body) = send(
        app(Ok("Amazon Bedrock is a managed service.".to_string())),
        post_rag(r#"{"prompt":"What is Amazon Bedrock?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "response": "Amazon Bedrock is a managed service.", "context_retrieved": true })
    );
}

#[tokio::test]
async fn missing_or_empty_prompt_is_bad_request() {
    for raw in ["{}", r#"{"prompt":""}"#, ""] {
        let (status, body) = send(app(Ok("never".to_string())), post_rag(raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw:?}");
        assert_eq!(body["error"], "No prompt provided");
        assert_eq!(body["code"], "RAG_INVALID_INPUT");
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (status, body) = send(app(Ok("never".to_string())), post_rag("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "RAG_INVALID_INPUT");
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let (status, body) = send(
        app(Err(AppError::new("THROTTLED", "too many requests").with_retryable(true))),
        post_rag(r#"{"prompt":"q"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "RAG_GENERATION_FAILED");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn health_reports_service_name() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(Ok(String::new())), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "service": "bedrock-rag" }));
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/rag")
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app(Ok(String::new())).oneshot(req).await.expect("request success");

    assert!(response.status().is_success());
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(allow_origin, "*");
    let allow_methods = response
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(allow_methods.contains("POST"));
}

#[test]
fn proxy_event_with_string_body() {
    let event = json!({ "body": r#"{"prompt":"What is Amazon Bedrock?"}"# });
    let out = handle_proxy_event(&pipeline(Ok("managed service".to_string())), &event);

    assert_eq!(out["statusCode"], 200);
    assert_eq!(out["headers"]["Access-Control-Allow-Origin"], "*");
    let body: Value = serde_json::from_str(out["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({ "response": "managed service", "context_retrieved": true }));
}

#[test]
fn proxy_event_with_object_or_missing_body() {
    let p = pipeline(Ok("ok".to_string()));

    let out = handle_proxy_event(&p, &json!({ "body": { "prompt": "hi" } }));
    assert_eq!(out["statusCode"], 200);

    let out = handle_proxy_event(&p, &json!({ "httpMethod": "POST" }));
    assert_eq!(out["statusCode"], 400);
    let body: Value = serde_json::from_str(out["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["error"], "No prompt provided");
}

#[test]
fn proxy_event_maps_stage_failures() {
    let p = pipeline(Err(AppError::new("RAG_GENERATION_FAILED", "model unavailable")));
    let out = handle_proxy_event(&p, &json!({ "body": { "prompt": "hi" } }));
    assert_eq!(out["statusCode"], 502);
    let body: Value = serde_json::from_str(out["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["code"], "RAG_GENERATION_FAILED");
    assert_eq!(body["error"], "model unavailable");
}
