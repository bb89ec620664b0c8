//! Channel trait: the abstraction over input front-ends.
//!
//! A Channel delivers user utterances to the conversation loop and shows
//! replies back. The interactive terminal is the built-in channel.

use async_trait::async_trait;
use crate::error::ChannelError;

/// A message received from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Channel name this message arrived on
    pub channel: String,

    /// The text content, trimmed and non-empty
    pub content: String,
}

/// The core Channel trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "cli").
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    ///
    /// Returns a receiver that yields incoming messages. The receiver closes
    /// when the underlying input ends.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChannelMessage, ChannelError>>,
        ChannelError,
    >;

    /// Show a reply to the user.
    async fn send(&self, content: &str) -> std::result::Result<(), ChannelError>;
}
