//! Telegram worker: polled messages in, router replies out

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::TelegramChannel;
use super::polling::polling_loop;
use crate::channels::{Channel, IncomingMessage, OutgoingMessage};
use crate::config::TelegramConfig;
use crate::lifecycle::Origin;
use crate::locale::Language;
use crate::router::CommandRouter;

pub(crate) const UNAUTHORIZED_REPLY: &str = "⛔ Unauthorized user.";
pub(crate) const START_REPLY: &str = "👋 Ziggy is ready!";

/// What the bridge does with one incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeAction {
    /// Sender is not on the allow-list
    Reject,
    /// `/start`
    Greet,
    /// Any other slash command
    Ignore,
    /// Resolve and dispatch the text
    Route,
}

/// Connects a [`TelegramChannel`] to the [`CommandRouter`]
pub struct TelegramBridge {
    channel: TelegramChannel,
    router: Arc<CommandRouter>,
    allowed_users: Vec<i64>,
    poll_interval: Duration,
}

impl TelegramBridge {
    #[must_use]
    pub fn new(channel: TelegramChannel, router: Arc<CommandRouter>, config: &TelegramConfig) -> Self {
        Self {
            channel,
            router,
            allowed_users: config.allowed_users.clone(),
            poll_interval: config.poll_interval,
        }
    }

    /// An empty allow-list admits everyone
    #[must_use]
    pub fn is_authorized(&self, sender_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&sender_id)
    }

    #[must_use]
    pub fn action_for(&self, msg: &IncomingMessage) -> BridgeAction {
        if !self.is_authorized(msg.sender_id) {
            return BridgeAction::Reject;
        }
        match msg.command() {
            Some("start") => BridgeAction::Greet,
            Some(_) => BridgeAction::Ignore,
            None if msg.is_command() => BridgeAction::Ignore,
            None => BridgeAction::Route,
        }
    }

    /// Compute the reply for one message, dispatching it if needed
    pub async fn respond(&self, msg: &IncomingMessage) -> Option<String> {
        match self.action_for(msg) {
            BridgeAction::Reject => {
                tracing::warn!(sender_id = msg.sender_id, "unauthorized Telegram user");
                Some(UNAUTHORIZED_REPLY.to_string())
            }
            BridgeAction::Greet => Some(START_REPLY.to_string()),
            BridgeAction::Ignore => None,
            BridgeAction::Route => {
                tracing::info!(
                    sender_id = msg.sender_id,
                    sender = %msg.sender_name,
                    text = %msg.content,
                    "Telegram command received"
                );
                let language = Language::detect(&msg.content);
                let reply = self
                    .router
                    .handle(&msg.content, language, &Origin::Telegram(msg.sender_id))
                    .await;
                (!reply.is_empty()).then_some(reply)
            }
        }
    }

    /// Poll and answer messages until `shutdown` flips to `true`
    ///
    /// Messages are handled one at a time; a message already being
    /// dispatched when shutdown arrives is finished and answered.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) {
        if let Err(e) = self.channel.connect().await {
            tracing::error!(error = %e, "Telegram connect failed, bridge disabled");
            return;
        }

        let (tx, mut rx) = mpsc::channel(64);
        let poller = tokio::spawn(polling_loop(
            self.channel.clone(),
            tx,
            self.poll_interval,
            shutdown,
        ));

        // Closes when the poller exits
        while let Some(msg) = rx.recv().await {
            if let Some(reply) = self.respond(&msg).await
                && let Err(e) = self.channel.send(OutgoingMessage::reply(&msg, reply)).await
            {
                tracing::warn!(chat_id = msg.chat_id, error = %e, "failed to send Telegram reply");
            }
        }

        if let Err(e) = poller.await {
            tracing::warn!(error = %e, "Telegram poller task failed");
        }
        if let Err(e) = self.channel.disconnect().await {
            tracing::warn!(error = %e, "Telegram disconnect failed");
        }
    }
}
