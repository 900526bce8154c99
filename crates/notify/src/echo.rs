//! Local echo used when no messaging credential is configured.

use crate::blocks::Block;
use crate::traits::{Messenger, NotifyError};

/// Prints messages to stdout instead of sending them anywhere.
#[derive(Debug, Default)]
pub struct LocalEchoMessenger;

impl LocalEchoMessenger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Messenger for LocalEchoMessenger {
    async fn post(
        &self,
        channel: &str,
        text: &str,
        blocks: Option<&[Block]>,
    ) -> Result<(), NotifyError> {
        tracing::info!(channel, "no bot token configured, echoing message locally");
        println!("[messaging stub] {channel}: {text}");
        if let Some(blocks) = blocks {
            match serde_json::to_string_pretty(blocks) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "could not render blocks for echo"),
            }
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "local-echo"
    }
}
