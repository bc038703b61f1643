//! IFTTT Maker webhook integration

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::capabilities::EventTrigger;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://maker.ifttt.com";

/// Client for IFTTT Maker webhooks
#[derive(Debug, Clone)]
pub struct IftttClient {
    client: Client,
    base_url: String,
    key: String,
}

/// Webhook body; IFTTT exposes the values as ingredients
#[derive(Debug, Default, Serialize)]
struct TriggerPayload<'a> {
    value1: Option<&'a str>,
    value2: Option<&'a str>,
    value3: Option<&'a str>,
}

impl IftttClient {
    /// Create a client for the public Maker endpoint
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, key)
    }

    /// Create a client against a different endpoint
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            key: key.into(),
        }
    }

    fn trigger_url(&self, event: &str) -> String {
        format!("{}/trigger/{event}/with/key/{}", self.base_url, self.key)
    }
}

#[async_trait]
impl EventTrigger for IftttClient {
    async fn trigger(&self, event: &str, value: Option<&str>) -> Result<()> {
        let event = event.trim();
        if event.is_empty() || !event.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(Error::InvalidInput(format!("invalid IFTTT event name '{event}'")));
        }

        let payload = TriggerPayload {
            value1: value,
            ..TriggerPayload::default()
        };

        let response = self
            .client
            .post(self.trigger_url(event))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Integration(format!("IFTTT request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Integration(format!("IFTTT error: {status} - {body}")));
        }

        tracing::info!(event, "IFTTT event triggered");
        Ok(())
    }
}
