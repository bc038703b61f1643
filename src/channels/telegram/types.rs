//! Telegram Bot API request/response types

use serde::{Deserialize, Serialize};

/// Telegram Bot API base URL
pub(crate) const API_BASE: &str = "https://api.telegram.org/bot";

/// Server-side long-poll timeout for getUpdates, in seconds
pub(crate) const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram sendMessage request
#[derive(Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

/// Telegram getUpdates request
#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesRequest {
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl GetUpdatesRequest {
    pub(crate) const fn messages_from(offset: Option<i64>) -> Self {
        Self {
            timeout: LONG_POLL_TIMEOUT_SECS,
            allowed_updates: &["message"],
            offset,
        }
    }
}

/// Telegram API response wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// Bot identity returned by getMe
#[derive(Debug, Deserialize)]
pub(crate) struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// A single update from getUpdates
#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Message carried by an update
#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

/// Chat info
#[derive(Debug, Deserialize)]
pub(crate) struct Chat {
    pub id: i64,
}

/// User info
#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_updates_request_shape() {
        let first = serde_json::to_value(GetUpdatesRequest::messages_from(None)).unwrap();
        assert_eq!(
            first,
            serde_json::json!({"timeout": 30, "allowed_updates": ["message"]})
        );

        let next = serde_json::to_value(GetUpdatesRequest::messages_from(Some(11))).unwrap();
        assert_eq!(next["offset"], 11);
    }

    #[test]
    fn test_send_message_omits_missing_reply() {
        let request = SendMessageRequest {
            chat_id: 5,
            text: "שלום",
            reply_to_message_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"chat_id": 5, "text": "שלום"}));
    }

    #[test]
    fn test_update_deserializes_with_unknown_fields() {
        let raw = r#"{
            "update_id": 100,
            "message": {
                "message_id": 3,
                "date": 1700000000,
                "chat": {"id": -55, "type": "group", "title": "home"},
                "from": {"id": 9, "is_bot": false, "first_name": "Noa", "language_code": "he"},
                "text": "מה השעה"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, -55);
        assert_eq!(message.from.unwrap().first_name, "Noa");
        assert_eq!(message.text.as_deref(), Some("מה השעה"));
    }
}
