//! Observer error types.

use thiserror::Error;

use atlas_notify::NotifyError;
use atlas_orchestrator::OrchestratorError;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("orchestrator query failed: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("digest delivery failed: {0}")]
    Delivery(#[from] NotifyError),

    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
