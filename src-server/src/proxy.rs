//! Adapter for API-Gateway proxy events (`{"body": ...}` in,
//! `{statusCode, headers, body}` out).

use axum::http::StatusCode;
use rag_ai::rag::RagPipeline;
use rag_core::domain::RagRequest;
use rag_core::error::{AppError, INVALID_INPUT};
use serde_json::{json, Value};

use crate::server::{error_body, parse_request, status_for};

/// Run one proxy event through the pipeline. Never fails: errors become a
/// response with the matching status code.
pub fn handle_proxy_event(pipeline: &RagPipeline, event: &Value) -> Value {
    tracing::info!("processing proxy event");
    let outcome = event_request(event).and_then(|req| pipeline.answer(&req.prompt));
    match outcome {
        Ok(res) => proxy_response(StatusCode::OK, &json!(res)),
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!(code = %err.code, retryable = err.retryable, "proxy event failed");
            }
            proxy_response(status, &error_body(&err))
        }
    }
}

/// The body may arrive as a JSON-encoded string, an inline object, or not at all.
fn event_request(event: &Value) -> Result<RagRequest, AppError> {
    match event.get("body") {
        None | Some(Value::Null) => Ok(RagRequest::default()),
        Some(Value::String(raw)) => parse_request(raw.as_bytes()),
        Some(other) => serde_json::from_value(other.clone()).map_err(|e| {
            AppError::new(INVALID_INPUT, "Event body must be a JSON object with a prompt")
                .with_details(e.to_string())
        }),
    }
}

fn proxy_response(status: StatusCode, body: &Value) -> Value {
    json!({
        "statusCode": status.as_u16(),
        "headers": {
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*",
            "Access-Control-Allow-Methods": "POST, OPTIONS",
            "Access-Control-Allow-Headers": "Content-Type"
        },
        "body": body.to_string(),
    })
}

/// Event shape produced by a POST through API Gateway.
pub fn mock_event(prompt: &str) -> Value {
    json!({
        "body": json!({ "prompt": prompt }).to_string(),
        "httpMethod": "POST",
        "path": "/rag",
        "headers": { "Content-Type": "application/json" },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_body_forms() {
        assert_eq!(event_request(&json!({})).unwrap().prompt, "");
        assert_eq!(event_request(&json!({ "body": null })).unwrap().prompt, "");
        assert_eq!(
            event_request(&json!({ "body": { "prompt": "inline" } })).unwrap().prompt,
            "inline"
        );
        assert_eq!(event_request(&mock_event("encoded")).unwrap().prompt, "encoded");
        assert_eq!(
            event_request(&json!({ "body": 42 })).unwrap_err().code,
            INVALID_INPUT
        );
    }
}
