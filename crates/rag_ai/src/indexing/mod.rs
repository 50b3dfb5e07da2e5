use rag_core::domain::Document;
use rag_core::error::{AppError, INVALID_INPUT};
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;
use crate::search::DocumentIndex;

pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingSummary {
    pub total: usize,
    pub indexed: usize,
    pub failed: usize,
    pub batches: usize,
}

/// Embed and bulk-index `docs` batch by batch.
///
/// A batch whose embedding or bulk write fails is counted as failed and the
/// run moves on; only index creation failures abort the run.
pub fn index_documents(
    embedder: &dyn Embedder,
    index: &dyn DocumentIndex,
    docs: &[Document],
    batch_size: usize,
) -> Result<IndexingSummary, AppError> {
    if docs.is_empty() {
        return Err(AppError::new(INVALID_INPUT, "No documents to index"));
    }
    let batch_size = batch_size.max(1);
    let batches = docs.len().div_ceil(batch_size);

    index.ensure_index()?;
    tracing::info!(total = docs.len(), batches, "starting indexing");

    let mut summary = IndexingSummary {
        total: docs.len(),
        batches,
        ..IndexingSummary::default()
    };

    for (i, batch) in docs.chunks(batch_size).enumerate() {
        let n = i + 1;
        tracing::info!(batch = n, of = batches, size = batch.len(), "processing batch");

        let embedded: Result<Vec<(Document, Vec<f32>)>, AppError> = batch
            .iter()
            .map(|doc| embedder.embed(&doc.content).map(|v| (doc.clone(), v)))
            .collect();
        let embedded = match embedded {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(batch = n, error = %e, "embedding failed; skipping batch");
                summary.failed += batch.len();
                continue;
            }
        };

        match index.bulk_index(&embedded) {
            Ok(outcome) => {
                summary.indexed += outcome.indexed;
                summary.failed += outcome.failed;
                if outcome.failed > 0 {
                    tracing::warn!(batch = n, failed = outcome.failed, "batch partially indexed");
                }
            }
            Err(e) => {
                tracing::warn!(batch = n, error = %e, "bulk indexing failed");
                summary.failed += batch.len();
            }
        }
    }

    tracing::info!(
        total = summary.total,
        indexed = summary.indexed,
        failed = summary.failed,
        "indexing complete"
    );
    Ok(summary)
}
