//! Telegram polling mode: getUpdates loop and message conversion

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::TelegramChannel;
use super::dedup::UpdateDedup;
use super::types::Update;
use crate::channels::IncomingMessage;

/// Run the polling loop until `shutdown` flips to `true`
///
/// Deletes any existing webhook first so getUpdates works. Successful
/// polls follow each other immediately (the server holds the request);
/// a failed poll backs off for `retry_interval`. Messages are
/// forwarded in update order; the sender is dropped on exit, which closes
/// the receiving side.
pub async fn polling_loop(
    channel: TelegramChannel,
    tx: mpsc::Sender<IncomingMessage>,
    retry_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = channel.delete_webhook().await {
        tracing::warn!(error = %e, "failed to delete Telegram webhook before polling");
    }

    let mut offset: Option<i64> = None;
    let mut dedup = UpdateDedup::default();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let updates = tokio::select! {
            result = channel.get_updates(offset) => result,
            _ = shutdown.changed() => break,
        };

        match updates {
            Ok(updates) => {
                for update in &updates {
                    // Advance offset past this update
                    offset = Some(update.update_id + 1);

                    if dedup.is_duplicate(update.update_id) {
                        tracing::debug!(update_id = update.update_id, "duplicate Telegram update");
                        continue;
                    }

                    if let Some(msg) = update_to_incoming(update)
                        && tx.send(msg).await.is_err()
                    {
                        tracing::debug!("Telegram receiver closed, stopping polling");
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telegram getUpdates error");
                tokio::select! {
                    () = tokio::time::sleep(retry_interval) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }
    }

    tracing::info!("Telegram polling stopped");
}

/// Convert an update into an [`IncomingMessage`]
///
/// Only text messages from humans are kept.
pub(crate) fn update_to_incoming(update: &Update) -> Option<IncomingMessage> {
    let msg = update.message.as_ref()?;

    let text = msg.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }

    // Skip bot messages
    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        return None;
    }

    // Channel posts carry no sender; attribute them to the chat
    let sender_id = msg.from.as_ref().map_or(msg.chat.id, |u| u.id);

    let sender_name = msg
        .from
        .as_ref()
        .map_or_else(|| "Unknown".to_string(), |u| u.first_name.clone());

    Some(IncomingMessage {
        id: msg.message_id,
        chat_id: msg.chat.id,
        sender_id,
        sender_name,
        content: text.to_string(),
    })
}
