use rag_core::config::{RagConfig, DEFAULT_RESULT_LIMIT};
use rag_core::domain::{sort_by_score_desc, RagResponse};
use rag_core::error::{AppError, EMBEDDING_FAILED, GENERATION_FAILED, INVALID_INPUT, SEARCH_FAILED};

use crate::bedrock::BedrockClient;
use crate::embeddings::bedrock_embed::BedrockEmbedder;
use crate::embeddings::Embedder;
use crate::llm::bedrock_llm::BedrockGenerator;
use crate::llm::Generator;
use crate::search::opensearch::OpenSearchClient;
use crate::search::Searcher;

pub mod prompts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOptions {
    pub result_limit: usize,
    /// Reject query vectors whose length differs from the stored index.
    pub expected_dims: Option<usize>,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            result_limit: DEFAULT_RESULT_LIMIT,
            expected_dims: None,
        }
    }
}

impl AnswerOptions {
    pub fn from_config(cfg: &RagConfig) -> Self {
        Self {
            result_limit: cfg.result_limit,
            expected_dims: cfg.embedding_dimension,
        }
    }
}

/// embed -> search -> augment -> generate.
///
/// Only an empty prompt is rejected; whitespace is passed through as typed.
/// A search with no usable results (none, or only blank contents) is not an
/// error: the bare prompt goes to the generator and `context_retrieved` is
/// false. Every other stage failure is returned under its stage code and
/// stops the pipeline.
pub fn answer_with(
    embedder: &dyn Embedder,
    searcher: &dyn Searcher,
    generator: &dyn Generator,
    opts: &AnswerOptions,
    prompt: &str,
) -> Result<RagResponse, AppError> {
    if prompt.is_empty() {
        return Err(AppError::new(INVALID_INPUT, "No prompt provided"));
    }
    let limit = opts.result_limit.max(1);

    tracing::info!(prompt_chars = prompt.chars().count(), "generating embeddings for prompt");
    let vector = embedder
        .embed(prompt)
        .map_err(|e| e.wrap(EMBEDDING_FAILED, "Embedding stage failed"))?;

    if let Some(dims) = opts.expected_dims {
        if vector.len() != dims {
            return Err(AppError::new(
                SEARCH_FAILED,
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={dims}; query_dims={}", vector.len())));
        }
    }

    tracing::info!(dims = vector.len(), limit, "searching for relevant context");
    let mut results = searcher
        .search(&vector, limit)
        .map_err(|e| e.wrap(SEARCH_FAILED, "Search stage failed"))?;
    sort_by_score_desc(&mut results);
    results.truncate(limit);
    results.retain(|r| !r.document.content.trim().is_empty());

    let (generation_prompt, context_retrieved) = if results.is_empty() {
        tracing::warn!("no context retrieved; generating from the bare prompt");
        (prompt.to_string(), false)
    } else {
        tracing::info!(results = results.len(), "retrieved context items");
        let context = prompts::context_block(&results);
        (prompts::augmented_prompt(&context, prompt), true)
    };

    let response = generator
        .generate(&generation_prompt)
        .map_err(|e| e.wrap(GENERATION_FAILED, "Generation stage failed"))?;

    tracing::info!(response_chars = response.chars().count(), context_retrieved, "generated response");
    Ok(RagResponse {
        response,
        context_retrieved,
    })
}

/// Owns the three capabilities for the lifetime of the process.
pub struct RagPipeline {
    embedder: Box<dyn Embedder>,
    searcher: Box<dyn Searcher>,
    generator: Box<dyn Generator>,
    options: AnswerOptions,
}

impl RagPipeline {
    pub fn new(
        embedder: Box<dyn Embedder>,
        searcher: Box<dyn Searcher>,
        generator: Box<dyn Generator>,
        options: AnswerOptions,
    ) -> Self {
        Self {
            embedder,
            searcher,
            generator,
            options,
        }
    }

    /// Bedrock for embeddings and generation, OpenSearch for retrieval.
    pub fn from_config(cfg: &RagConfig) -> Result<Self, AppError> {
        let bedrock = BedrockClient::from_config(&cfg.bedrock)?;
        let embedder = BedrockEmbedder::new(bedrock.clone(), cfg.bedrock.embedding_model_id.clone());
        let generator = BedrockGenerator::from_config(bedrock, &cfg.bedrock)?;
        let searcher = OpenSearchClient::new(&cfg.search)?;
        Ok(Self::new(
            Box::new(embedder),
            Box::new(searcher),
            Box::new(generator),
            AnswerOptions::from_config(cfg),
        ))
    }

    pub fn options(&self) -> &AnswerOptions {
        &self.options
    }

    pub fn answer(&self, prompt: &str) -> Result<RagResponse, AppError> {
        answer_with(
            self.embedder.as_ref(),
            self.searcher.as_ref(),
            self.generator.as_ref(),
            &self.options,
            prompt,
        )
    }
}
