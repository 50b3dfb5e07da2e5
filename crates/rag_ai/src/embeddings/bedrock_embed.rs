use std::time::Duration;

use rag_core::domain::EmbeddingVector;
use rag_core::error::{AppError, EMBEDDING_FAILED};
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::bedrock::BedrockClient;
use crate::http;

/// Titan text-embedding models (`amazon.titan-embed-*`).
#[derive(Debug, Clone)]
pub struct BedrockEmbedder {
    client: BedrockClient,
    model_id: String,
}

impl BedrockEmbedder {
    pub fn new(client: BedrockClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingsRequest<'a> {
    input_text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

impl Embedder for BedrockEmbedder {
    fn embed(&self, input: &str) -> Result<EmbeddingVector, AppError> {
        tracing::debug!(model_id = %self.model_id, input_chars = input.chars().count(), "creating embedding");

        let body = http::encode_json(&EmbeddingsRequest { input_text: input }, EMBEDDING_FAILED, "embeddings")?;
        let raw = self
            .client
            .invoke_model(&self.model_id, &body, Duration::from_secs(10), EMBEDDING_FAILED)?;
        let v: EmbeddingsResponse = serde_json::from_value(raw).map_err(|e| {
            AppError::new(EMBEDDING_FAILED, "Failed to decode embeddings response")
                .with_details(e.to_string())
        })?;
        if v.embedding.is_empty() {
            return Err(AppError::new(EMBEDDING_FAILED, "Embeddings response was empty")
                .with_details(format!("model_id={}", self.model_id)));
        }

        tracing::info!(model_id = %self.model_id, dims = v.embedding.len(), "embedding created");
        Ok(v.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_titan_field_name() {
        let v = serde_json::to_value(EmbeddingsRequest { input_text: "hello" }).unwrap();
        assert_eq!(v, serde_json::json!({ "inputText": "hello" }));
    }

    #[test]
    fn response_ignores_token_count() {
        let v: EmbeddingsResponse =
            serde_json::from_str(r#"{"embedding": [0.5, -1.0], "inputTextTokenCount": 3}"#).unwrap();
        assert_eq!(v.embedding, vec![0.5, -1.0]);
    }
}
