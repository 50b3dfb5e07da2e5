//! `bedrock-rag` entry point.
//!
//! Configuration comes from the environment (optionally seeded from an env
//! file); see `RagConfig::from_lookup` for the recognised variables.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bedrock_rag::logging::init_logging;
use bedrock_rag::proxy::mock_event;
use bedrock_rag::{build_router, handle_proxy_event, AppState};
use clap::{Parser, Subcommand};
use rag_ai::bedrock::BedrockClient;
use rag_ai::embeddings::bedrock_embed::BedrockEmbedder;
use rag_ai::indexing::{index_documents, DEFAULT_BATCH_SIZE};
use rag_ai::rag::RagPipeline;
use rag_ai::search::opensearch::OpenSearchClient;
use rag_core::config::{LogFormat, RagConfig};
use rag_core::error::AppError;
use rag_core::ingest::{load_documents, sample_documents, save_documents};
use serde_json::Value;
use tracing::info;

/// Retrieval-augmented generation over Bedrock and OpenSearch
#[derive(Parser)]
#[command(name = "bedrock-rag")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Environment file loaded before reading configuration
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve,

    /// Answer one prompt through the proxy adapter and print the result
    Ask {
        /// Question to answer
        #[arg(short, long)]
        prompt: String,
    },

    /// Create the vector index if needed and index documents
    Index {
        /// JSON array of documents; the built-in samples are used when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Documents per bulk request
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Write the built-in sample documents to a JSON file
    SampleData {
        #[arg(short, long, default_value = "sample_data.json")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(code = %err.code, details = err.details.as_deref().unwrap_or_default(), "command failed");
            eprintln!("error: {err}");
            if let Some(details) = &err.details {
                eprintln!("  {details}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    if let Commands::SampleData { output } = &cli.command {
        init_logging("info", LogFormat::Text);
        return write_samples(output);
    }

    let cfg = RagConfig::from_env_file(&cli.env_file)?;
    init_logging(&cfg.log_level, cfg.log_format);
    info!(
        region = %cfg.bedrock.region,
        embedding_model = %cfg.bedrock.embedding_model_id,
        generation_model = %cfg.bedrock.generation_model_id,
        search = %cfg.search.base_url(),
        index = %cfg.search.index,
        "configuration loaded"
    );

    match cli.command {
        Commands::Serve => {
            let rt = tokio::runtime::Runtime::new().map_err(|e| {
                AppError::new("SERVER_START_FAILED", "Failed to start async runtime")
                    .with_details(e.to_string())
            })?;
            rt.block_on(serve(cfg))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ask { prompt } => ask(&cfg, &prompt),
        Commands::Index { file, batch_size } => index(&cfg, file.as_deref(), batch_size),
        Commands::SampleData { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn serve(cfg: RagConfig) -> Result<(), AppError> {
    let pipeline = RagPipeline::from_config(&cfg)?;
    let app = build_router(AppState::new(pipeline));

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::new("SERVER_START_FAILED", "Failed to bind listener")
            .with_details(format!("addr={addr}; err={e}"))
    })?;
    info!(%addr, "bedrock-rag listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|e| AppError::new("SERVER_FAILED", "HTTP server failed").with_details(e.to_string()))
}

fn ask(cfg: &RagConfig, prompt: &str) -> Result<ExitCode, AppError> {
    let pipeline = RagPipeline::from_config(cfg)?;
    info!(prompt_chars = prompt.chars().count(), "calling handler with mock event");
    let out = handle_proxy_event(&pipeline, &mock_event(prompt));

    let status = out["statusCode"].as_u64().unwrap_or_default();
    let body: Value = out["body"]
        .as_str()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);

    let rule = "-".repeat(80);
    println!("\n{rule}\nRAG Response:\n{rule}");
    println!("Status Code: {status}");
    match body.get("response").and_then(Value::as_str) {
        Some(answer) => {
            println!("\nGenerated Answer:\n{answer}");
            let retrieved = body["context_retrieved"].as_bool().unwrap_or(false);
            println!("\nContext Retrieved: {}", if retrieved { "Yes" } else { "No" });
        }
        None => println!("\nError: {body}"),
    }
    println!("{rule}");

    Ok(if status == 200 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn index(cfg: &RagConfig, file: Option<&Path>, batch_size: usize) -> Result<ExitCode, AppError> {
    let docs = match file {
        Some(path) => load_documents(path)?,
        None => sample_documents(),
    };

    let bedrock = BedrockClient::from_config(&cfg.bedrock)?;
    let embedder = BedrockEmbedder::new(bedrock, cfg.bedrock.embedding_model_id.clone());
    let store = OpenSearchClient::new(&cfg.search)?;

    let summary = index_documents(&embedder, &store, &docs, batch_size)?;
    println!(
        "Indexed {}/{} documents into '{}' ({} batches, {} failed)",
        summary.indexed,
        summary.total,
        store.index_name(),
        summary.batches,
        summary.failed
    );
    Ok(if summary.failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn write_samples(output: &Path) -> Result<ExitCode, AppError> {
    let docs = sample_documents();
    save_documents(output, &docs)?;
    info!(path = %output.display(), count = docs.len(), "wrote sample documents");
    println!("Wrote {} sample documents to {}", docs.len(), output.display());
    Ok(ExitCode::SUCCESS)
}
