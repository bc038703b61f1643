//! Messaging channel adapters
//!
//! A channel carries text commands in and replies out. Telegram is the only
//! adapter; the trait keeps the worker independent of the transport.

pub mod telegram;

use async_trait::async_trait;

pub use telegram::{TelegramBridge, TelegramChannel};

use crate::Result;

/// A text message received from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message identifier (platform-specific)
    pub id: i64,

    /// Chat the message arrived in; replies go back here
    pub chat_id: i64,

    /// Sender identifier, checked against the allow-list
    pub sender_id: i64,

    /// Sender display name
    pub sender_name: String,

    /// Message text
    pub content: String,
}

impl IncomingMessage {
    /// Whether the message is a slash command such as `/start`
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.content.trim_start().starts_with('/')
    }

    /// The command name without the leading slash or a `@botname` suffix
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        let rest = self.content.trim_start().strip_prefix('/')?;
        let word = rest.split_whitespace().next()?;
        Some(word.split('@').next().unwrap_or(word))
    }
}

/// A reply to send to a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Destination chat
    pub chat_id: i64,

    /// Plain text content
    pub content: String,

    /// Optional message to reply to
    pub reply_to: Option<i64>,
}

impl OutgoingMessage {
    /// Create a simple `text` message
    #[must_use]
    pub fn text(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            reply_to: None,
        }
    }

    /// Create a `reply` to an incoming message
    #[must_use]
    pub fn reply(to: &IncomingMessage, content: impl Into<String>) -> Self {
        Self {
            chat_id: to.chat_id,
            content: content.into(),
            reply_to: Some(to.id),
        }
    }
}

/// Trait for messaging channel adapters
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Connect to the channel
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the channel
    async fn disconnect(&mut self) -> Result<()>;

    /// Send a message
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> IncomingMessage {
        IncomingMessage {
            id: 7,
            chat_id: 42,
            sender_id: 1001,
            sender_name: "Dana".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(message("/start").command(), Some("start"));
        assert_eq!(message("/start@ziggy_bot hello").command(), Some("start"));
        assert_eq!(message("  /help").command(), Some("help"));
        assert_eq!(message("what time is it").command(), None);
        assert_eq!(message("/").command(), None);
        assert!(message("/").is_command());
    }

    #[test]
    fn test_reply_targets_incoming_chat() {
        let incoming = message("hi");
        let reply = OutgoingMessage::reply(&incoming, "hello");
        assert_eq!(reply.chat_id, 42);
        assert_eq!(reply.reply_to, Some(7));
        assert_eq!(OutgoingMessage::text(5, "x").reply_to, None);
    }
}
