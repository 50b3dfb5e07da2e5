use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::Document;
use crate::error::AppError;

/// Shape accepted from document files: `id` and `metadata` are optional.
#[derive(Debug, Clone, Deserialize)]
struct DocumentInput {
    id: Option<String>,
    content: String,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
}

/// Content-derived id used when a document arrives without one.
pub fn content_id(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

pub fn parse_documents(json: &str) -> Result<Vec<Document>, AppError> {
    let inputs: Vec<DocumentInput> = serde_json::from_str(json).map_err(|e| {
        AppError::new("INGEST_PARSE_FAILED", "Documents file must be a JSON array of documents")
            .with_details(e.to_string())
    })?;

    let mut out = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.into_iter().enumerate() {
        if input.content.trim().is_empty() {
            return Err(AppError::new("INGEST_PARSE_FAILED", "Document content must not be empty")
                .with_details(format!("index={i}")));
        }
        let id = match input.id.map(|s| s.trim().to_string()) {
            Some(id) if !id.is_empty() => id,
            _ => content_id(&input.content),
        };
        let metadata = input
            .metadata
            .into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();
        out.push(Document {
            id,
            content: input.content,
            metadata,
        });
    }
    Ok(out)
}

pub fn load_documents(path: &Path) -> Result<Vec<Document>, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new("INGEST_READ_FAILED", "Failed to read documents file")
            .with_details(format!("path={}; err={e}", path.display()))
    })?;
    let docs = parse_documents(&raw)?;
    tracing::info!(path = %path.display(), count = docs.len(), "loaded documents");
    Ok(docs)
}

pub fn save_documents(path: &Path, docs: &[Document]) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(docs).map_err(|e| {
        AppError::new("INGEST_WRITE_FAILED", "Failed to serialize documents")
            .with_details(e.to_string())
    })?;
    fs::write(path, json).map_err(|e| {
        AppError::new("INGEST_WRITE_FAILED", "Failed to write documents file")
            .with_details(format!("path={}; err={e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), count = docs.len(), "saved documents");
    Ok(())
}

pub fn sample_documents() -> Vec<Document> {
    let sample = |id: &str, content: &str, category: &str, topic: &str| {
        Document::new(id, content)
            .with_metadata("source", "sample")
            .with_metadata("category", category)
            .with_metadata("topic", topic)
    };
    vec![
        sample(
            "doc1",
            "Amazon Bedrock is a fully managed service that offers a choice of high-performing foundation models (FMs) from leading AI companies like AI21 Labs, Anthropic, Cohere, Meta, Stability AI, and Amazon via a single API, along with a broad set of capabilities to build generative AI applications with security, privacy, and responsible AI.",
            "aws",
            "bedrock",
        ),
        sample(
            "doc2",
            "Amazon OpenSearch Service is a managed service that makes it easy to deploy, operate, and scale OpenSearch clusters in the AWS Cloud. OpenSearch is a fully open-source search and analytics engine for use cases such as log analytics, real-time application monitoring, and clickstream analysis.",
            "aws",
            "opensearch",
        ),
        sample(
            "doc3",
            "AWS Lambda is a serverless compute service that lets you run code without provisioning or managing servers, creating workload-aware cluster scaling logic, maintaining event integrations, or managing runtimes. With Lambda, you can run code for virtually any type of application or backend service - all with zero administration.",
            "aws",
            "lambda",
        ),
        sample(
            "doc4",
            "Amazon API Gateway is a fully managed service that makes it easy for developers to create, publish, maintain, monitor, and secure APIs at any scale. APIs act as the 'front door' for applications to access data, business logic, or functionality from your backend services.",
            "aws",
            "api-gateway",
        ),
        sample(
            "doc5",
            "Retrieval-Augmented Generation (RAG) is a technique used in natural language processing where an LLM retrieves facts from an external knowledge source to ground its responses in reliable, up-to-date information. This helps reduce hallucinations and provides source attribution.",
            "concept",
            "rag",
        ),
    ]
}
