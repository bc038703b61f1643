//! OpenAI-compatible chat completion client
//!
//! Backs both the semantic classifier and the free-form knowledge fallback.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::capabilities::KnowledgeSource;
use crate::config::LlmConfig;
use crate::intent::CompletionBackend;
use crate::{Error, Result};

/// Chat completion client
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Create a client from configuration
    ///
    /// The HTTP timeout is the configured classification timeout.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no API key is configured, or `Error::Http`
    /// if the HTTP client cannot be built
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Run one chat completion and return the reply text
    ///
    /// # Errors
    ///
    /// Returns `Error::Llm` on transport failure, a non-success status, or a
    /// response without content
    pub async fn chat(&self, system: Option<&str>, user: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: user,
        });

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error: {status} - {body}")));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Llm("response has no content".to_string()))
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat(Some(system), user).await
    }
}

#[async_trait]
impl KnowledgeSource for ChatClient {
    async fn answer(&self, question: &str) -> Result<String> {
        let answer = self.chat(None, question).await?;
        Ok(answer.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn llm_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(ToString::to_string),
            base_url: "https://llm.example.com/".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(15),
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(ChatClient::new(&llm_config(None)), Err(Error::Config(_))));
    }

    #[test]
    fn test_base_url_normalized() {
        let client = ChatClient::new(&llm_config(Some("sk-test"))).unwrap();
        assert_eq!(client.base_url, "https://llm.example.com");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatCompletionRequest {
            model: "m",
            messages: vec![
                Message {
                    role: "system",
                    content: "classify",
                },
                Message {
                    role: "user",
                    content: "מה השעה",
                },
            ],
            temperature: 0.3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "מה השעה");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"intent\": \"get_time\"}"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"intent\": \"get_time\"}")
        );
    }
}
