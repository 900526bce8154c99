//! Slack Web API messenger.
//!
//! Delivers messages via `chat.postMessage` with a bot token. Slack answers
//! HTTP 200 even for most failures, so the `ok` field decides success.

use std::time::Duration;

use crate::blocks::Block;
use crate::traits::{Messenger, NotifyError};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Timeout for one delivery attempt.
const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends messages through the Slack Web API.
#[derive(Debug)]
pub struct SlackMessenger {
    bot_token: String,
    endpoint: String,
    client: reqwest::Client,
}

impl SlackMessenger {
    /// Create a messenger for `bot_token`. Empty tokens are rejected.
    pub fn new(bot_token: String) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() {
            return Err(NotifyError::Config(
                "Slack bot token must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(POST_TIMEOUT).build()?;

        Ok(Self {
            bot_token,
            endpoint: POST_MESSAGE_URL.to_string(),
            client,
        })
    }
}

/// Build the `chat.postMessage` request body.
fn payload(channel: &str, text: &str, blocks: Option<&[Block]>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "channel": channel,
        "text": text,
    });
    if let Some(blocks) = blocks.filter(|b| !b.is_empty()) {
        body["blocks"] = serde_json::to_value(blocks).unwrap_or_default();
    }
    body
}

/// Interpret a Slack API response body.
fn check_response(
    status: reqwest::StatusCode,
    retry_after: Option<u64>,
    body: &serde_json::Value,
) -> Result<(), NotifyError> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(NotifyError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(30),
        });
    }

    if body.get("ok") == Some(&serde_json::Value::Bool(true)) {
        return Ok(());
    }

    let error = body
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown Slack API error");
    Err(NotifyError::Api(format!("{error} (HTTP {status})")))
}

#[async_trait::async_trait]
impl Messenger for SlackMessenger {
    async fn post(
        &self,
        channel: &str,
        text: &str,
        blocks: Option<&[Block]>,
    ) -> Result<(), NotifyError> {
        let body = payload(channel, text, blocks);

        tracing::debug!(
            channel,
            blocks = blocks.map_or(0, <[Block]>::len),
            "Sending Slack message"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let resp_body: serde_json::Value = response.json().await.unwrap_or_default();

        check_response(status, retry_after, &resp_body)?;
        tracing::info!(channel, "Slack message sent");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::blocks::TextObject;

    #[test]
    fn empty_token_rejected() {
        let err = SlackMessenger::new(String::new()).unwrap_err().to_string();
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn payload_without_blocks() {
        let body = payload("#ops", "hello", None);
        assert_eq!(body, json!({"channel": "#ops", "text": "hello"}));
    }

    #[test]
    fn payload_with_blocks() {
        let blocks = vec![
            Block::Header { text: TextObject::plain("Title") },
            Block::Divider,
        ];
        let body = payload("#ops", "hello", Some(blocks.as_slice()));
        assert_eq!(body["blocks"][0]["type"], "header");
        assert_eq!(body["blocks"][0]["text"]["type"], "plain_text");
        assert_eq!(body["blocks"][1], json!({"type": "divider"}));
    }

    #[test]
    fn ok_response_accepted() {
        assert!(check_response(StatusCode::OK, None, &json!({"ok": true})).is_ok());
    }

    #[test]
    fn api_error_surfaces_slack_code() {
        let err = check_response(
            StatusCode::OK,
            None,
            &json!({"ok": false, "error": "channel_not_found"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }

    #[test]
    fn rate_limit_uses_retry_after() {
        let err = check_response(StatusCode::TOO_MANY_REQUESTS, Some(12), &json!({})).unwrap_err();
        assert!(matches!(err, NotifyError::RateLimited { retry_after_secs: 12 }));
    }

    #[test]
    fn channel_name_is_slack() {
        let m = SlackMessenger::new("xoxb-test".into()).unwrap();
        assert_eq!(m.channel_name(), "slack");
    }
}
