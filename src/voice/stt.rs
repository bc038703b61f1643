//! Speech-to-text over the Whisper transcription API

use serde::Deserialize;

use crate::locale::Language;
use crate::{Error, Result};

/// Whisper `verbose_json` response (only the fields used)
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// A transcribed utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language: Language,
}

impl Transcript {
    fn from_response(response: WhisperResponse) -> Self {
        let text = response.text.trim().to_string();
        // Whisper reports a language name ("hebrew"); Hebrew script wins otherwise
        let language = response
            .language
            .as_deref()
            .and_then(Language::from_tag)
            .unwrap_or_else(|| Language::detect(&text));
        Self { text, language }
    }
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SpeechToText {
    /// Create a Whisper client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Transcribe WAV audio
    ///
    /// # Errors
    ///
    /// Returns error if the request or response parsing fails
    pub async fn transcribe(&self, wav: &[u8]) -> Result<Transcript> {
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Stt(format!("Whisper request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(format!("failed to parse Whisper response: {e}")))?;

        let transcript = Transcript::from_response(result);
        tracing::info!(transcript = %transcript.text, language = %transcript.language, "transcription complete");
        Ok(transcript)
    }
}
