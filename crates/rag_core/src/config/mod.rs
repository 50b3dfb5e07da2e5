//! Process-wide configuration, read once at startup and passed explicitly to
//! every client and the orchestrator.

use std::path::Path;

use serde::Serialize;

use crate::error::{AppError, CONFIG_INVALID};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_EMBEDDING_MODEL_ID: &str = "amazon.titan-embed-text-v1";
pub const DEFAULT_GENERATION_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_INDEX: &str = "rag-documents";
pub const DEFAULT_RESULT_LIMIT: usize = 3;
pub const DEFAULT_INDEX_DIMENSION: usize = 1536;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BedrockConfig {
    pub region: String,
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub embedding_model_id: String,
    pub generation_model_id: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchConfig {
    pub host: String,
    pub port: u16,
    pub index: String,
    pub use_ssl: bool,
    pub verify_certs: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub index_dimension: usize,
}

impl SearchConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let host = self
            .host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!("{scheme}://{host}:{}", self.port)
    }

    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagConfig {
    pub bedrock: BedrockConfig,
    pub search: SearchConfig,
    pub result_limit: usize,
    /// When set, query vectors of any other length are rejected before search.
    pub embedding_dimension: Option<usize>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl RagConfig {
    /// Load a specific env file, falling back to the process environment alone
    /// when the file does not exist.
    pub fn from_env_file(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            dotenvy::from_path(path).map_err(|e| {
                AppError::new(CONFIG_INVALID, "Failed to load env file")
                    .with_details(format!("path={}; err={e}", path.display()))
            })?;
            tracing::info!(path = %path.display(), "loaded environment file");
        } else {
            tracing::warn!(path = %path.display(), "environment file not found; using process environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let region = get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = get("BEDROCK_ENDPOINT")
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://bedrock-runtime.{region}.amazonaws.com"));
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(AppError::new(CONFIG_INVALID, "BEDROCK_ENDPOINT must be an http(s) URL")
                .with_details(format!("value={endpoint}")));
        }

        let bedrock = BedrockConfig {
            endpoint,
            api_key: get("AWS_BEARER_TOKEN_BEDROCK"),
            embedding_model_id: get("EMBEDDING_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL_ID.to_string()),
            generation_model_id: get("GENERATION_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_GENERATION_MODEL_ID.to_string()),
            max_tokens: parse_or("GENERATION_MAX_TOKENS", get("GENERATION_MAX_TOKENS"), 1000)?,
            temperature: parse_or("GENERATION_TEMPERATURE", get("GENERATION_TEMPERATURE"), 0.7)?,
            region,
        };
        if !(0.0..=1.0).contains(&bedrock.temperature) {
            return Err(AppError::new(CONFIG_INVALID, "GENERATION_TEMPERATURE must be within 0.0..=1.0")
                .with_details(format!("value={}", bedrock.temperature)));
        }

        if parse_bool("USE_AWS_AUTH", get("USE_AWS_AUTH"), false)? {
            return Err(AppError::new(
                CONFIG_INVALID,
                "AWS request signing is not supported; use OPENSEARCH_USERNAME/OPENSEARCH_PASSWORD",
            ));
        }

        let search = SearchConfig {
            host: get("OPENSEARCH_ENDPOINT").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or("OPENSEARCH_PORT", get("OPENSEARCH_PORT"), 9200)?,
            index: get("OPENSEARCH_INDEX").unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            use_ssl: parse_bool("OPENSEARCH_USE_SSL", get("OPENSEARCH_USE_SSL"), true)?,
            verify_certs: parse_bool("OPENSEARCH_VERIFY_CERTS", get("OPENSEARCH_VERIFY_CERTS"), true)?,
            username: get("OPENSEARCH_USERNAME"),
            password: get("OPENSEARCH_PASSWORD"),
            index_dimension: parse_or("OPENSEARCH_DIMENSION", get("OPENSEARCH_DIMENSION"), DEFAULT_INDEX_DIMENSION)?,
        };
        if search.use_ssl && !search.verify_certs {
            return Err(AppError::new(
                CONFIG_INVALID,
                "Disabling certificate verification is not supported",
            )
            .with_details("set OPENSEARCH_USE_SSL=false for plain-http local clusters"));
        }
        if search.index_dimension == 0 {
            return Err(AppError::new(CONFIG_INVALID, "OPENSEARCH_DIMENSION must be at least 1"));
        }

        let result_limit = parse_or("MAX_SEARCH_RESULTS", get("MAX_SEARCH_RESULTS"), DEFAULT_RESULT_LIMIT)?;
        if result_limit == 0 {
            return Err(AppError::new(CONFIG_INVALID, "MAX_SEARCH_RESULTS must be at least 1"));
        }

        let embedding_dimension = match get("EMBEDDING_DIMENSION") {
            Some(raw) => Some(parse_value::<usize>("EMBEDDING_DIMENSION", &raw)?),
            None => None,
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::new(CONFIG_INVALID, "LOG_FORMAT must be text or json")
                    .with_details(format!("value={other}")))
            }
        };

        Ok(Self {
            bedrock,
            search,
            result_limit,
            embedding_dimension,
            host: get("RAG_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("RAG_PORT", get("RAG_PORT"), 8080)?,
            log_level: get("LOG_LEVEL")
                .map(|v| v.to_ascii_lowercase())
                .unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>().map_err(|_| {
        AppError::new(CONFIG_INVALID, format!("{key} has an invalid value"))
            .with_details(format!("value={raw}"))
    })
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool, AppError> {
    let Some(v) = raw else {
        return Ok(default);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::new(CONFIG_INVALID, format!("{key} must be a boolean"))
            .with_details(format!("value={v}"))),
    }
}
