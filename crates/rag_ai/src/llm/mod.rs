use rag_core::error::AppError;

/// Text generation from a fully assembled prompt.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

pub mod bedrock_llm;
