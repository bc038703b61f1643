//! Command routing: text in, reply out
//!
//! The single entry point shared by the voice worker, the Telegram worker
//! and the CLI.

use crate::dispatch::Dispatcher;
use crate::intent::{IntentResolver, ResolvedIntent};
use crate::lifecycle::Origin;
use crate::locale::Language;

/// Resolves and dispatches utterances
pub struct CommandRouter {
    resolver: IntentResolver,
    dispatcher: Dispatcher,
}

impl CommandRouter {
    #[must_use]
    pub const fn new(resolver: IntentResolver, dispatcher: Dispatcher) -> Self {
        Self {
            resolver,
            dispatcher,
        }
    }

    /// The dispatcher, for shutdown-time access to shared state
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Resolve without dispatching
    pub async fn resolve(&self, text: &str) -> ResolvedIntent {
        let text = text.trim();
        if text.is_empty() {
            return ResolvedIntent::unknown();
        }
        self.resolver.resolve(text).await
    }

    /// Resolve and dispatch one utterance, returning the reply text
    pub async fn handle(&self, text: &str, language: Language, origin: &Origin) -> String {
        let resolved = self.resolve(text).await;
        self.dispatcher.dispatch_as(&resolved, language, origin).await
    }
}
