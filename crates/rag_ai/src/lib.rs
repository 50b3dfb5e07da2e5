pub mod bedrock;
pub mod embeddings;
mod http;
pub mod indexing;
pub mod llm;
pub mod rag;
pub mod search;
