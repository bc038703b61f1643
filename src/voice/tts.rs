//! Text-to-speech over the OpenAI speech API

use serde::Serialize;

use crate::{Error, Result};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f64,
}

/// Synthesizes speech from text (MP3 output)
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    speed: f64,
}

impl TextToSpeech {
    /// Create an OpenAI TTS client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: &str, base_url: &str, model: &str, voice: &str, speed: f64) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            voice: voice.to_string(),
            // API accepts 0.25..=4.0
            speed: speed.clamp(0.25, 4.0),
        })
    }

    fn request<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        }
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request(text))
            .send()
            .await
            .map_err(|e| Error::Tts(format!("OpenAI TTS request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let tts = TextToSpeech::new("k", "https://api.openai.com/", "tts-1", "alloy", 9.0).unwrap();
        assert_eq!(tts.base_url, "https://api.openai.com");

        let json = serde_json::to_value(tts.request("זיגי מוכן")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "tts-1", "input": "זיגי מוכן", "voice": "alloy", "speed": 4.0})
        );
    }

    #[test]
    fn test_requires_key() {
        assert!(TextToSpeech::new("", "https://api.openai.com", "tts-1", "alloy", 1.0).is_err());
    }
}
