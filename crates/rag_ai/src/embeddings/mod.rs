use rag_core::domain::EmbeddingVector;
use rag_core::error::AppError;

pub trait Embedder: Send + Sync {
    fn embed(&self, input: &str) -> Result<EmbeddingVector, AppError>;
}

pub mod bedrock_embed;
