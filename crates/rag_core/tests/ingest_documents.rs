use std::fs;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use rag_core::ingest::{content_id, load_documents, parse_documents, sample_documents, save_documents};

#[test]
fn missing_ids_are_derived_from_content() {
    let docs = parse_documents(
        r#"[
            {"id": "doc1", "content": "first", "metadata": {"topic": "a", "rank": 2}},
            {"content": "second"},
            {"id": "  ", "content": "third"}
        ]"#,
    )
    .expect("parse");

    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].id, "doc1");
    assert_eq!(docs[0].metadata.get("topic").map(String::as_str), Some("a"));
    assert_eq!(docs[0].metadata.get("rank").map(String::as_str), Some("2"));
    assert_eq!(docs[1].id, content_id("second"));
    assert_eq!(docs[1].id.len(), 64);
    assert_eq!(docs[2].id, content_id("third"));
    assert!(docs[1].metadata.is_empty());
}

#[test]
fn rejects_non_array_and_empty_content() {
    let err = parse_documents(r#"{"content": "x"}"#).expect_err("object");
    assert_eq!(err.code, "INGEST_PARSE_FAILED");

    let err = parse_documents(r#"[{"content": "ok"}, {"content": "   "}]"#).expect_err("blank");
    assert_eq!(err.code, "INGEST_PARSE_FAILED");
    assert_eq!(err.details.as_deref(), Some("index=1"));
}

#[test]
fn save_then_load_preserves_sample_documents() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("sample_data.json");

    let docs = sample_documents();
    save_documents(&path, &docs).expect("save");
    assert!(fs::read_to_string(&path).unwrap().contains("\"doc5\""));

    let loaded = load_documents(&path).expect("load");
    assert_eq!(loaded, docs);
}

#[test]
fn missing_file_is_a_read_error() {
    let tmp = tempdir().unwrap();
    let err = load_documents(&tmp.path().join("nope.json")).expect_err("missing");
    assert_eq!(err.code, "INGEST_READ_FAILED");
}

#[test]
fn sample_documents_cover_each_topic() {
    let docs = sample_documents();
    let topics: Vec<&str> = docs
        .iter()
        .filter_map(|d| d.metadata.get("topic").map(String::as_str))
        .collect();
    assert_eq!(topics, vec!["bedrock", "opensearch", "lambda", "api-gateway", "rag"]);
    assert!(docs[0].content.starts_with("Amazon Bedrock is a fully managed service"));
}
