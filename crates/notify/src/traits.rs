//! Messenger trait definition and shared error types.

use std::sync::Arc;

use crate::blocks::Block;
use crate::echo::LocalEchoMessenger;
use crate::slack::SlackMessenger;

/// Errors that can occur during message delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("messaging API rejected the message: {0}")]
    Api(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A channel a digest can be posted to.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    /// Post `text` (the fallback/notification text) with optional rich blocks.
    async fn post(
        &self,
        channel: &str,
        text: &str,
        blocks: Option<&[Block]>,
    ) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "slack", "local-echo").
    fn channel_name(&self) -> &str;
}

/// Pick the messenger for a configured token.
///
/// A missing or blank token yields the local echo, which never fails and
/// never touches the network.
pub fn messenger_from_token(token: Option<&str>) -> Arc<dyn Messenger> {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => match SlackMessenger::new(token.to_string()) {
            Ok(slack) => Arc::new(slack),
            Err(e) => {
                tracing::warn!(error = %e, "Slack messenger unavailable, falling back to local echo");
                Arc::new(LocalEchoMessenger::new())
            }
        },
        None => Arc::new(LocalEchoMessenger::new()),
    }
}
