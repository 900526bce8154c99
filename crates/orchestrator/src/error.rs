//! Orchestrator error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("orchestrator returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid orchestrator URL: {0}")]
    InvalidUrl(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}
