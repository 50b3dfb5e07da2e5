use serde::{Deserialize, Serialize};
use std::fmt;

pub const INVALID_INPUT: &str = "RAG_INVALID_INPUT";
pub const EMBEDDING_FAILED: &str = "RAG_EMBEDDING_FAILED";
pub const SEARCH_FAILED: &str = "RAG_SEARCH_FAILED";
pub const GENERATION_FAILED: &str = "RAG_GENERATION_FAILED";
pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

/// Single structured error shape used across the pipeline and exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Re-tag an error under `code` unless it already carries it.
    ///
    /// The inner error is kept in `details`; `retryable` is preserved.
    pub fn wrap(self, code: &str, message: &str) -> Self {
        if self.code == code {
            return self;
        }
        let inner = match &self.details {
            Some(d) => format!("{self}: {d}"),
            None => self.to_string(),
        };
        AppError::new(code, message)
            .with_details(inner)
            .with_retryable(self.retryable)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
