//! LLM-backed semantic intent classifier
//!
//! Sends the utterance together with the rendered intent catalog to a
//! language model and validates the JSON it returns. Every failure degrades
//! to the `unknown` intent; nothing is propagated to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::catalog::{render_catalog, validate_params};
use super::{Intent, Params, ResolutionSource, ResolvedIntent};
use crate::{Error, Result};

/// A chat-completion style model call: system framing plus one user turn
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Return the raw text of the model's reply
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success response
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Classifier stage of the resolver
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify text; never fails, degrades to `unknown`
    async fn classify(&self, text: &str) -> ResolvedIntent;
}

/// Catalog-driven classifier over a [`CompletionBackend`]
pub struct SemanticClassifier {
    backend: Arc<dyn CompletionBackend>,
    system_prompt: String,
    timeout: Duration,
}

impl SemanticClassifier {
    /// Create a classifier
    ///
    /// # Arguments
    ///
    /// * `backend` - Model call used for classification
    /// * `assistant_name` - Name used in the system framing
    /// * `timeout` - Upper bound on a single classification call
    #[must_use]
    pub fn new(backend: Arc<dyn CompletionBackend>, assistant_name: &str, timeout: Duration) -> Self {
        Self {
            backend,
            system_prompt: build_system_prompt(assistant_name),
            timeout,
        }
    }

    /// The system prompt sent with every request
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    async fn try_classify(&self, text: &str) -> Result<ResolvedIntent> {
        let raw = tokio::time::timeout(self.timeout, self.backend.complete(&self.system_prompt, text))
            .await
            .map_err(|_| {
                Error::Classifier(format!("no response within {}s", self.timeout.as_secs_f32()))
            })??;

        parse_classifier_output(&raw).inspect_err(|e| {
            tracing::warn!(error = %e, raw = %raw, "classifier returned invalid output");
        })
    }
}

#[async_trait]
impl Classifier for SemanticClassifier {
    async fn classify(&self, text: &str) -> ResolvedIntent {
        match self.try_classify(text).await {
            Ok(resolved) => {
                tracing::debug!(intent = %resolved.intent, params = resolved.params.len(), "classified");
                resolved
            }
            Err(e) => {
                tracing::warn!(error = %e, text, "classification failed, using unknown");
                ResolvedIntent::unknown()
            }
        }
    }
}

fn build_system_prompt(assistant_name: &str) -> String {
    format!(
        "You are a smart home assistant named {assistant_name}. The user speaks Hebrew or English.\n\
         Classify the user's request and return a JSON object with:\n\
         - \"intent\": one of the intent names listed below\n\
         - \"params\": an object with the arguments for that intent\n\n\
         Supported intents:\n{catalog}\n\
         If nothing fits, return {{\"intent\": \"unknown\", \"params\": {{}}}}.\n\
         Always return the JSON object and nothing else.",
        catalog = render_catalog()
    )
}

/// Parse and validate raw classifier output
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
///
/// # Errors
///
/// Returns `Error::Classifier` if the output is not a well-formed
/// `{intent, params}` object, names an intent outside the catalog, or has
/// parameters that do not match the intent's schema
pub fn parse_classifier_output(raw: &str) -> Result<ResolvedIntent> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Classifier(format!("response is not JSON: {e}")))?;

    let Value::Object(mut object) = value else {
        return Err(Error::Classifier("response is not a JSON object".to_string()));
    };

    let name = match object.remove("intent") {
        Some(Value::String(name)) => name,
        _ => return Err(Error::Classifier("missing string field 'intent'".to_string())),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(Error::Classifier("'params' is not an object".to_string())),
    };

    if name.trim().eq_ignore_ascii_case("unknown") {
        return Ok(ResolvedIntent::new(
            Intent::Unknown,
            Params::new(),
            ResolutionSource::Classifier,
        ));
    }

    let intent = Intent::from_name(&name)
        .ok_or_else(|| Error::Classifier(format!("intent '{name}' is not in the catalog")))?;
    let params = validate_params(intent, params)?;

    Ok(ResolvedIntent::new(intent, params, ResolutionSource::Classifier))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
