//! Telegram channel adapter
//!
//! Receives commands by long polling getUpdates and answers through the
//! Bot API. [`TelegramBridge`] connects the adapter to the command router.

mod api;
mod bridge;
pub mod dedup;
pub mod polling;
mod types;

use async_trait::async_trait;
use reqwest::Client;

use super::{Channel, OutgoingMessage};
use crate::Result;

pub use bridge::{BridgeAction, TelegramBridge};
pub use dedup::UpdateDedup;

/// Telegram channel adapter
#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    api_base: String,
    client: Client,
    connected: bool,
}

impl TelegramChannel {
    /// Create a new Telegram channel adapter
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, types::API_BASE)
    }

    /// Create an adapter against a self-hosted Bot API server
    #[must_use]
    pub fn with_api_base(token: String, api_base: impl Into<String>) -> Self {
        Self {
            token,
            api_base: api_base.into(),
            client: Client::new(),
            connected: false,
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn connect(&mut self) -> Result<()> {
        let username = self.get_me().await?;
        self.connected = true;
        tracing::info!(bot = username.as_deref().unwrap_or("?"), "Telegram channel connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        tracing::info!("Telegram channel disconnected");
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.send_message(message.chat_id, &message.content, message.reply_to)
            .await
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
