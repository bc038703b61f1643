//! Raw Telegram Bot API calls

use serde::de::DeserializeOwned;

use super::types::{BotUser, GetUpdatesRequest, SendMessageRequest, TelegramResponse, Update};
use crate::{Error, Result};

impl super::TelegramChannel {
    fn method_url(&self, method: &str) -> String {
        format!("{}{}/{method}", self.api_base, self.token)
    }

    /// Unwrap the `{ok, result, description}` envelope
    async fn read_envelope<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let envelope: TelegramResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Channel(format!("Telegram {method} returned {status}: {e}: {body}"))
        })?;

        if !envelope.ok {
            return Err(Error::Channel(format!(
                "Telegram {method} error: {status} - {}",
                envelope.description.unwrap_or(body)
            )));
        }

        envelope
            .result
            .ok_or_else(|| Error::Channel(format!("Telegram {method} returned no result")))
    }

    /// Send a plain-text message to a chat
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram API error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body_lower = body.to_lowercase();

            if body_lower.contains("chat not found")
                || body_lower.contains("bot was blocked by the user")
            {
                return Err(Error::Channel(format!(
                    "Telegram chat {chat_id} not reachable: {body}"
                )));
            }

            return Err(Error::Channel(format!(
                "Telegram API error: {status} - {body}"
            )));
        }

        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Verify the bot token, returning the bot's username
    ///
    /// # Errors
    ///
    /// Returns error if the token is rejected or the API is unreachable
    pub async fn get_me(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram getMe error: {e}")))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Channel("Invalid Telegram bot token".to_string()));
        }

        let bot: BotUser = Self::read_envelope("getMe", response).await?;
        tracing::debug!(bot_id = bot.id, "Telegram bot identified");
        Ok(bot.username)
    }

    /// Delete webhook (switch to polling mode)
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn delete_webhook(&self) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("deleteWebhook"))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram deleteWebhook error: {e}")))?;

        let _: bool = Self::read_envelope("deleteWebhook", response).await?;
        tracing::info!("Telegram webhook deleted");
        Ok(())
    }

    /// Long-poll for updates after `offset`
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response is malformed
    pub(crate) async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&GetUpdatesRequest::messages_from(offset))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram getUpdates error: {e}")))?;

        Self::read_envelope("getUpdates", response).await
    }
}
