use rag_core::domain::{Document, SearchResult};
use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

/// Nearest-neighbour lookup against an external vector store.
pub trait Searcher: Send + Sync {
    /// Returns at most `limit` results ordered by descending score.
    fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchResult>, AppError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkIndexOutcome {
    pub indexed: usize,
    pub failed: usize,
}

/// Write side of the vector store, used by the indexing pipeline.
pub trait DocumentIndex: Send + Sync {
    fn ensure_index(&self) -> Result<(), AppError>;
    fn bulk_index(&self, batch: &[(Document, Vec<f32>)]) -> Result<BulkIndexOutcome, AppError>;
}

pub mod opensearch;
