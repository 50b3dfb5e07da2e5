//! HTTP surface for the RAG pipeline: an axum router for long-running
//! deployments and an API-Gateway style proxy adapter for one-shot calls.

pub mod logging;
pub mod proxy;
pub mod server;

pub use proxy::handle_proxy_event;
pub use server::{build_router, error_body, status_for, AppState};
