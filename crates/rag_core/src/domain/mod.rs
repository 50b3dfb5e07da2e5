use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Embedding produced per request; dimensionality is fixed by the model.
pub type EmbeddingVector = Vec<f32>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagResponse {
    pub response: String,
    pub context_retrieved: bool,
}

/// Order results by descending score; equal scores fall back to document id so
/// the context block is deterministic.
pub fn sort_by_score_desc(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.document.id.cmp(&b.document.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32) -> SearchResult {
        SearchResult {
            document: Document::new(id, format!("content of {id}")),
            score,
        }
    }

    #[test]
    fn sorts_descending_with_id_tie_break() {
        let mut v = vec![hit("b", 0.5), hit("c", 0.9), hit("a", 0.5)];
        sort_by_score_desc(&mut v);
        let ids: Vec<&str> = v.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn request_without_prompt_field_is_empty() {
        let req: RagRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(req.prompt, "");
    }
}
