pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;

#[cfg(test)]
mod tests {
    use super::error::{AppError, EMBEDDING_FAILED, SEARCH_FAILED};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new(SEARCH_FAILED, "search failed").with_retryable(false);
        assert_eq!(err.code, "RAG_SEARCH_FAILED");
        assert_eq!(err.message, "search failed");
        assert_eq!(err.retryable, false);
        assert_eq!(err.to_string(), "[RAG_SEARCH_FAILED] search failed");
    }

    #[test]
    fn wrap_retags_foreign_codes_and_keeps_inner_error() {
        let inner = AppError::new("BEDROCK_HTTP", "upstream refused")
            .with_details("status=503")
            .with_retryable(true);
        let wrapped = inner.wrap(EMBEDDING_FAILED, "Embedding stage failed");
        assert_eq!(wrapped.code, EMBEDDING_FAILED);
        assert!(wrapped.retryable);
        assert_eq!(
            wrapped.details.as_deref(),
            Some("[BEDROCK_HTTP] upstream refused: status=503")
        );
    }

    #[test]
    fn wrap_is_identity_for_matching_code() {
        let err = AppError::new(EMBEDDING_FAILED, "empty embedding");
        assert_eq!(err.clone().wrap(EMBEDDING_FAILED, "other"), err);
    }
}
