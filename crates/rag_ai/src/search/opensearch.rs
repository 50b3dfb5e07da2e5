use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use base64::Engine;
use rag_core::config::SearchConfig;
use rag_core::domain::{sort_by_score_desc, Document, SearchResult};
use rag_core::error::{AppError, SEARCH_FAILED};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{BulkIndexOutcome, DocumentIndex, Searcher};
use crate::http;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct OpenSearchClient {
    base_url: String,
    index: String,
    dimension: usize,
    authorization: Option<String>,
    agent: ureq::Agent,
}

impl fmt::Debug for OpenSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("base_url", &self.base_url)
            .field("index", &self.index)
            .field("dimension", &self.dimension)
            .field("authenticated", &self.authorization.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id", default)]
    doc_id: Option<String>,
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Debug, Default, Deserialize)]
struct HitSource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    metadata: serde_json::Map<String, Value>,
}

impl Hit {
    fn into_result(self) -> SearchResult {
        let id = self
            .source
            .id
            .filter(|id| !id.is_empty())
            .or(self.doc_id)
            .unwrap_or_default();
        let metadata: BTreeMap<String, String> = self
            .source
            .metadata
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();
        SearchResult {
            document: Document {
                id,
                content: self.source.content,
                metadata,
            },
            score: self.score.unwrap_or(0.0),
        }
    }
}

impl OpenSearchClient {
    pub fn new(cfg: &SearchConfig) -> Result<Self, AppError> {
        let authorization = cfg.basic_auth().map(|(user, pass)| {
            let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
            format!("Basic {token}")
        });
        tracing::info!(
            base_url = %cfg.base_url(),
            index = %cfg.index,
            basic_auth = authorization.is_some(),
            "OpenSearch client initialized"
        );
        Ok(Self {
            base_url: cfg.base_url(),
            index: cfg.index.clone(),
            dimension: cfg.index_dimension,
            authorization,
            agent: http::agent(),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    fn request(&self, method: &str, path: &str, timeout: Duration) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let req = self
            .agent
            .request(method, &url)
            .timeout(timeout)
            .set("Accept", "application/json");
        match &self.authorization {
            Some(auth) => req.set("Authorization", auth),
            None => req,
        }
    }

    fn index_path(&self) -> String {
        format!("/{}", http::encode_path_segment(&self.index))
    }

    pub fn knn_query(vector: &[f32], limit: usize) -> Value {
        json!({
            "size": limit,
            "query": {
                "knn": {
                    "embedding": { "vector": vector, "k": limit }
                }
            },
            "_source": ["id", "content", "metadata"]
        })
    }

    pub fn index_mapping(dimension: usize) -> Value {
        json!({
            "settings": {
                "index": {
                    "number_of_shards": 2,
                    "number_of_replicas": 1,
                    "knn": true
                }
            },
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "content": { "type": "text" },
                    "metadata": { "type": "object" },
                    "embedding": {
                        "type": "knn_vector",
                        "dimension": dimension,
                        "method": {
                            "name": "hnsw",
                            "space_type": "cosinesimil",
                            "engine": "nmslib"
                        }
                    }
                }
            }
        })
    }

    fn source_for(doc: &Document, embedding: &[f32]) -> Value {
        json!({
            "id": doc.id,
            "content": doc.content,
            "metadata": doc.metadata,
            "embedding": embedding,
        })
    }

    /// Index one document and refresh so it is immediately searchable.
    pub fn index_document(&self, doc: &Document, embedding: &[f32]) -> Result<(), AppError> {
        let path = format!(
            "{}/_doc/{}?refresh=true",
            self.index_path(),
            http::encode_path_segment(&doc.id)
        );
        let body = Self::source_for(doc, embedding);
        http::check_status(
            self.request("PUT", &path, WRITE_TIMEOUT).send_json(&body),
            "INDEX_WRITE_FAILED",
            "OpenSearch index",
        )?;
        tracing::info!(doc_id = %doc.id, index = %self.index, "indexed document");
        Ok(())
    }

    pub fn bulk_body(&self, batch: &[(Document, Vec<f32>)]) -> String {
        let mut out = String::new();
        for (doc, embedding) in batch {
            let action = json!({ "index": { "_index": self.index, "_id": doc.id } });
            out.push_str(&action.to_string());
            out.push('\n');
            out.push_str(&Self::source_for(doc, embedding).to_string());
            out.push('\n');
        }
        out
    }
}

impl Searcher for OpenSearchClient {
    fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchResult>, AppError> {
        let path = format!("{}/_search", self.index_path());
        let query = Self::knn_query(vector, limit);

        let result = self.request("POST", &path, SEARCH_TIMEOUT).send_json(&query);
        if let Err(ureq::Error::Status(404, _)) = &result {
            tracing::warn!(index = %self.index, "index does not exist; returning no results");
            return Ok(Vec::new());
        }
        let resp = http::check_status(result, SEARCH_FAILED, "OpenSearch search")?;
        let parsed: SearchResponse = http::read_json(resp, SEARCH_FAILED, "OpenSearch search")?;

        let mut results: Vec<SearchResult> =
            parsed.hits.hits.into_iter().map(Hit::into_result).collect();
        sort_by_score_desc(&mut results);
        results.truncate(limit);

        tracing::info!(index = %self.index, results = results.len(), "search returned results");
        Ok(results)
    }
}

impl DocumentIndex for OpenSearchClient {
    fn ensure_index(&self) -> Result<(), AppError> {
        let path = self.index_path();
        match self.request("HEAD", &path, SEARCH_TIMEOUT).call() {
            Ok(_) => {
                tracing::info!(index = %self.index, "index already exists");
                return Ok(());
            }
            Err(ureq::Error::Status(404, _)) => {}
            Err(e) => {
                return http::check_status(Err(e), "INDEX_CREATE_FAILED", "OpenSearch index check")
                    .map(|_| ());
            }
        }

        tracing::info!(index = %self.index, dimension = self.dimension, "creating index");
        http::check_status(
            self.request("PUT", &path, WRITE_TIMEOUT)
                .send_json(Self::index_mapping(self.dimension)),
            "INDEX_CREATE_FAILED",
            "OpenSearch create index",
        )?;
        Ok(())
    }

    fn bulk_index(&self, batch: &[(Document, Vec<f32>)]) -> Result<BulkIndexOutcome, AppError> {
        if batch.is_empty() {
            return Ok(BulkIndexOutcome::default());
        }
        let body = self.bulk_body(batch);
        let resp = http::check_status(
            self.request("POST", "/_bulk?refresh=true", WRITE_TIMEOUT)
                .set("Content-Type", "application/x-ndjson")
                .send_string(&body),
            "INDEX_WRITE_FAILED",
            "OpenSearch bulk",
        )?;
        let parsed: Value = http::read_json(resp, "INDEX_WRITE_FAILED", "OpenSearch bulk")?;
        let outcome = bulk_outcome(&parsed, batch.len());
        tracing::info!(
            index = %self.index,
            indexed = outcome.indexed,
            failed = outcome.failed,
            "bulk indexing completed"
        );
        Ok(outcome)
    }
}

/// Count per-item failures in a `_bulk` response. Items missing from the
/// response are counted as failed.
pub fn bulk_outcome(resp: &Value, submitted: usize) -> BulkIndexOutcome {
    let items = resp.get("items").and_then(Value::as_array);
    let Some(items) = items else {
        let errors = resp.get("errors").and_then(Value::as_bool).unwrap_or(true);
        return if errors {
            BulkIndexOutcome { indexed: 0, failed: submitted }
        } else {
            BulkIndexOutcome { indexed: submitted, failed: 0 }
        };
    };

    let mut outcome = BulkIndexOutcome::default();
    for item in items {
        let op = item.get("index").or_else(|| item.get("create"));
        let ok = op
            .map(|op| {
                let status = op.get("status").and_then(Value::as_u64).unwrap_or(500);
                op.get("error").is_none() && status < 300
            })
            .unwrap_or(false);
        if ok {
            outcome.indexed += 1;
        } else {
            outcome.failed += 1;
        }
    }
    outcome.failed += submitted.saturating_sub(items.len());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_falls_back_to_document_id_and_stringifies_metadata() {
        let hit: Hit = serde_json::from_value(json!({
            "_id": "os-1",
            "_score": 0.42,
            "_source": { "content": "text", "metadata": { "topic": "rag", "rank": 3 } }
        }))
        .unwrap();
        let r = hit.into_result();
        assert_eq!(r.document.id, "os-1");
        assert_eq!(r.document.metadata["topic"], "rag");
        assert_eq!(r.document.metadata["rank"], "3");
        assert!((r.score - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn knn_query_uses_limit_for_size_and_k() {
        let q = OpenSearchClient::knn_query(&[0.5, 1.0], 3);
        assert_eq!(q["size"], 3);
        assert_eq!(q["query"]["knn"]["embedding"]["k"], 3);
        assert_eq!(q["query"]["knn"]["embedding"]["vector"], json!([0.5, 1.0]));
        assert_eq!(q["_source"], json!(["id", "content", "metadata"]));
    }

    #[test]
    fn mapping_carries_dimension() {
        let m = OpenSearchClient::index_mapping(1024);
        assert_eq!(m["mappings"]["properties"]["embedding"]["dimension"], 1024);
        assert_eq!(m["settings"]["index"]["knn"], true);
    }

    #[test]
    fn bulk_outcome_counts_item_errors() {
        let resp = json!({
            "errors": true,
            "items": [
                { "index": { "status": 201 } },
                { "index": { "status": 400, "error": { "type": "mapper_parsing_exception" } } }
            ]
        });
        assert_eq!(bulk_outcome(&resp, 3), BulkIndexOutcome { indexed: 1, failed: 2 });
        assert_eq!(
            bulk_outcome(&json!({ "errors": false }), 2),
            BulkIndexOutcome { indexed: 2, failed: 0 }
        );
    }
}
