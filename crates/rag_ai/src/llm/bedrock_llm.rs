use std::time::Duration;

use rag_core::config::BedrockConfig;
use rag_core::error::{AppError, CONFIG_INVALID, GENERATION_FAILED};
use serde_json::{json, Value};

use super::Generator;
use crate::bedrock::BedrockClient;

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const TOP_P: f64 = 0.9;

/// Provider families on Bedrock differ in request and response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    AnthropicClaude,
    AmazonTitan,
    Ai21,
    Cohere,
    MetaLlama,
}

impl ModelFamily {
    pub fn from_model_id(model_id: &str) -> Option<Self> {
        if model_id.starts_with("anthropic.claude") {
            Some(Self::AnthropicClaude)
        } else if model_id.starts_with("amazon.titan") {
            Some(Self::AmazonTitan)
        } else if model_id.starts_with("ai21") {
            Some(Self::Ai21)
        } else if model_id.starts_with("cohere") {
            Some(Self::Cohere)
        } else if model_id.starts_with("meta.llama") {
            Some(Self::MetaLlama)
        } else {
            None
        }
    }

    pub fn request_body(self, prompt: &str, params: &GenerationParams) -> Value {
        let max_tokens = params.max_tokens;
        let temperature = params.temperature;
        match self {
            Self::AnthropicClaude => json!({
                "anthropic_version": ANTHROPIC_VERSION,
                "max_tokens": max_tokens,
                "temperature": temperature,
                "messages": [
                    { "role": "user", "content": [{ "type": "text", "text": prompt }] }
                ]
            }),
            Self::AmazonTitan => json!({
                "inputText": prompt,
                "textGenerationConfig": {
                    "maxTokenCount": max_tokens,
                    "temperature": temperature,
                    "topP": TOP_P
                }
            }),
            Self::Ai21 => json!({
                "prompt": prompt,
                "maxTokens": max_tokens,
                "temperature": temperature,
                "topP": TOP_P
            }),
            Self::Cohere => json!({
                "prompt": prompt,
                "max_tokens": max_tokens,
                "temperature": temperature
            }),
            Self::MetaLlama => json!({
                "prompt": prompt,
                "max_gen_len": max_tokens,
                "temperature": temperature
            }),
        }
    }

    pub fn extract_text(self, body: &Value) -> Option<String> {
        let text = match self {
            Self::AnthropicClaude => body.pointer("/content/0/text"),
            Self::AmazonTitan => body.pointer("/results/0/outputText"),
            Self::Ai21 => body.pointer("/completions/0/data/text"),
            Self::Cohere => body.pointer("/generations/0/text"),
            Self::MetaLlama => body.get("generation"),
        };
        text.and_then(Value::as_str).map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BedrockGenerator {
    client: BedrockClient,
    model_id: String,
    family: ModelFamily,
    params: GenerationParams,
}

impl BedrockGenerator {
    /// Fails for model ids outside the supported provider families.
    pub fn new(
        client: BedrockClient,
        model_id: impl Into<String>,
        params: GenerationParams,
    ) -> Result<Self, AppError> {
        let model_id = model_id.into();
        let family = ModelFamily::from_model_id(&model_id).ok_or_else(|| {
            AppError::new(CONFIG_INVALID, "Unsupported generation model")
                .with_details(format!("model_id={model_id}"))
        })?;
        Ok(Self {
            client,
            model_id,
            family,
            params,
        })
    }

    pub fn from_config(client: BedrockClient, cfg: &BedrockConfig) -> Result<Self, AppError> {
        Self::new(
            client,
            cfg.generation_model_id.clone(),
            GenerationParams {
                max_tokens: cfg.max_tokens,
                temperature: cfg.temperature,
            },
        )
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }
}

impl Generator for BedrockGenerator {
    fn generate(&self, prompt: &str) -> Result<String, AppError> {
        tracing::info!(model_id = %self.model_id, prompt_chars = prompt.chars().count(), "generating response");

        let body = self.family.request_body(prompt, &self.params);
        let raw = self
            .client
            .invoke_model(&self.model_id, &body, Duration::from_secs(60), GENERATION_FAILED)?;

        let text = self.family.extract_text(&raw).ok_or_else(|| {
            AppError::new(GENERATION_FAILED, "Generation response missing output text")
                .with_details(format!("model_id={}", self.model_id))
        })?;
        if text.trim().is_empty() {
            return Err(AppError::new(GENERATION_FAILED, "Generation response was empty")
                .with_details(format!("model_id={}", self.model_id)));
        }
        Ok(text)
    }
}
