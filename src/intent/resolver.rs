//! Two-stage intent resolution

use std::sync::Arc;

use super::{Classifier, PatternMatcher, ResolvedIntent};

/// Resolves raw text to exactly one intent
///
/// Pattern rules run first; the classifier is consulted only when no rule
/// fires, so pattern-matched text never costs a model call.
pub struct IntentResolver {
    matcher: PatternMatcher,
    classifier: Arc<dyn Classifier>,
}

impl IntentResolver {
    #[must_use]
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            matcher: PatternMatcher::new(),
            classifier,
        }
    }

    /// Resolve one utterance; never fails
    pub async fn resolve(&self, text: &str) -> ResolvedIntent {
        if let Some(resolved) = self.matcher.match_text(text) {
            return resolved;
        }
        self.classifier.classify(text).await
    }
}
