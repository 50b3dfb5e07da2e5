//! Axum router for the RAG service.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/rag` | Answer `{"prompt": ...}` with retrieved context. |
//! | `GET`  | `/health` | Liveness check. |

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rag_ai::rag::RagPipeline;
use rag_core::domain::{RagRequest, RagResponse};
use rag_core::error::{AppError, EMBEDDING_FAILED, GENERATION_FAILED, INVALID_INPUT, SEARCH_FAILED};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const SERVICE_NAME: &str = "bedrock-rag";

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/rag", post(rag))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Input errors are the caller's fault; stage errors come from an upstream
/// service; anything else is ours.
pub fn status_for(err: &AppError) -> StatusCode {
    match err.code.as_str() {
        INVALID_INPUT => StatusCode::BAD_REQUEST,
        EMBEDDING_FAILED | SEARCH_FAILED | GENERATION_FAILED => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_body(err: &AppError) -> Value {
    json!({
        "error": err.message,
        "code": err.code,
        "retryable": err.retryable,
    })
}

/// Decode a `/rag` body. An empty body is an empty request so that it gets the
/// same "No prompt provided" answer as `{}`.
pub(crate) fn parse_request(body: &[u8]) -> Result<RagRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RagRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::new(INVALID_INPUT, "Request body must be a JSON object with a prompt")
            .with_details(e.to_string())
    })
}

pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(
                code = %self.0.code,
                retryable = self.0.retryable,
                details = self.0.details.as_deref().unwrap_or_default(),
                "request failed"
            );
        } else {
            tracing::warn!(code = %self.0.code, "request rejected");
        }
        (status, Json(error_body(&self.0))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn rag(State(state): State<AppState>, body: Bytes) -> Result<Json<RagResponse>, ApiError> {
    let req = parse_request(&body)?;
    let pipeline = Arc::clone(&state.pipeline);

    // The clients block on network I/O.
    let res = tokio::task::spawn_blocking(move || pipeline.answer(&req.prompt))
        .await
        .map_err(|e| {
            AppError::new("RAG_INTERNAL", "Request worker failed").with_details(e.to_string())
        })??;

    Ok(Json(res))
}
