use std::fmt;
use std::time::Duration;

use rag_core::config::BedrockConfig;
use rag_core::error::{AppError, CONFIG_INVALID};

use crate::http;

/// Bedrock runtime client shared by the embedding and generation wrappers.
#[derive(Clone)]
pub struct BedrockClient {
    endpoint: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedrockClient")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.api_key.is_some())
            .finish()
    }
}

impl BedrockClient {
    /// `endpoint` must be a bare `http(s)://host[:port]` origin.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();

        let authority = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"));
        let valid = match authority {
            Some(a) => !a.is_empty() && !a.contains(['/', '@', '?', '#']) && !a.ends_with(':'),
            None => false,
        };
        if !valid {
            return Err(AppError::new(
                CONFIG_INVALID,
                "Bedrock endpoint must be an http(s) origin without path or credentials",
            )
            .with_details(format!("endpoint={endpoint}")));
        }

        Ok(Self {
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            agent: http::agent(),
        })
    }

    pub fn from_config(cfg: &BedrockConfig) -> Result<Self, AppError> {
        Self::new(&cfg.endpoint, cfg.api_key.clone())
    }

    /// `POST /model/{model_id}/invoke`; failures are reported under `code`.
    pub fn invoke_model(
        &self,
        model_id: &str,
        body: &serde_json::Value,
        timeout: Duration,
        code: &str,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!(
            "{}/model/{}/invoke",
            self.endpoint,
            http::encode_path_segment(model_id)
        );
        let mut req = self
            .agent
            .post(&url)
            .timeout(timeout)
            .set("Accept", "application/json");
        if let Some(key) = &self.api_key {
            req = req.set("Authorization", &format!("Bearer {key}"));
        }

        let resp = http::check_status(req.send_json(body), code, "Bedrock invoke")
            .map_err(|e| match e.details {
                Some(d) => AppError::new(e.code, e.message)
                    .with_details(format!("model_id={model_id}; {d}"))
                    .with_retryable(e.retryable),
                None => e,
            })?;
        http::read_json(resp, code, "Bedrock invoke")
    }
}
