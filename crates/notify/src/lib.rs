//! Digest delivery.
//!
//! This crate provides:
//! - `Messenger` trait for pluggable delivery channels
//! - Slack `chat.postMessage` implementation
//! - Local echo fallback used when no bot token is configured
//! - Block rendering of a `DigestReport`

pub mod blocks;
pub mod echo;
pub mod slack;
pub mod traits;

pub use blocks::{render_digest, Block, TextObject, DIGEST_TITLE};
pub use echo::LocalEchoMessenger;
pub use slack::SlackMessenger;
pub use traits::{messenger_from_token, Messenger, NotifyError};
