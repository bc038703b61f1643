//! Deterministic keyword/regex intent matching
//!
//! The fast path of the resolver: an ordered list of bilingual rules over
//! lower-cased text. First match wins and matched intents never carry
//! parameters.

use std::sync::LazyLock;

use regex::Regex;

use super::{Intent, Params, ResolutionSource, ResolvedIntent};

/// A single bilingual rule
struct PatternRule {
    regex: Regex,
    intent: Intent,
}

/// Built-in rules, in priority order
///
/// Hebrew alternatives sit outside `\b` so that attached prefixes
/// ("השעה", "במזג") still match.
static RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    [
        (r"\b(what.*time|current time)\b|שעה", Intent::GetTime),
        (r"\b(what.*date|today's date)\b|תאריך", Intent::GetDate),
        (r"\bweather\b|מזג אוויר|מזג האוויר", Intent::GetWeather),
        (r"\bjoke\b|בדיחה", Intent::TellJoke),
        (r"\bfact\b|עובדה", Intent::TellFact),
        (r"\brestart\b|אתחל", Intent::Restart),
        (r"\bshutdown\b|כבה את ה?מערכת|כיבוי ה?מערכת", Intent::ShutdownSystem),
        (r"^\s*(confirm|אשר)\b", Intent::ConfirmAction),
    ]
    .into_iter()
    .map(|(pattern, intent)| PatternRule {
        regex: Regex::new(pattern).expect("valid regex"),
        intent,
    })
    .collect()
});

/// Stateless first-match-wins pattern matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternMatcher;

impl PatternMatcher {
    /// Create a matcher over the built-in rules
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Match text against the rules
    ///
    /// Returns `None` when no rule fires; that is the signal to fall back to
    /// the semantic classifier, not an error.
    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<ResolvedIntent> {
        let lower = text.to_lowercase();
        RULES
            .iter()
            .find(|rule| rule.regex.is_match(&lower))
            .map(|rule| {
                tracing::debug!(intent = %rule.intent, "pattern matched");
                ResolvedIntent::new(rule.intent, Params::new(), ResolutionSource::Pattern)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_of(text: &str) -> Option<Intent> {
        PatternMatcher::new().match_text(text).map(|r| r.intent)
    }

    #[test]
    fn test_english_rules() {
        assert_eq!(intent_of("What time is it?"), Some(Intent::GetTime));
        assert_eq!(intent_of("tell me the current time"), Some(Intent::GetTime));
        assert_eq!(intent_of("what's today's date"), Some(Intent::GetDate));
        assert_eq!(intent_of("How is the WEATHER"), Some(Intent::GetWeather));
        assert_eq!(intent_of("tell me a joke"), Some(Intent::TellJoke));
        assert_eq!(intent_of("give me a fun fact"), Some(Intent::TellFact));
        assert_eq!(intent_of("restart yourself"), Some(Intent::Restart));
        assert_eq!(intent_of("shutdown now"), Some(Intent::ShutdownSystem));
        assert_eq!(intent_of("confirm"), Some(Intent::ConfirmAction));
    }

    #[test]
    fn test_hebrew_rules() {
        assert_eq!(intent_of("מה השעה"), Some(Intent::GetTime));
        assert_eq!(intent_of("מה התאריך היום"), Some(Intent::GetDate));
        assert_eq!(intent_of("איך מזג האוויר"), Some(Intent::GetWeather));
        assert_eq!(intent_of("ספר לי בדיחה"), Some(Intent::TellJoke));
        assert_eq!(intent_of("תגיד עובדה"), Some(Intent::TellFact));
        assert_eq!(intent_of("אתחל"), Some(Intent::Restart));
        assert_eq!(intent_of("כבה את המערכת"), Some(Intent::ShutdownSystem));
        assert_eq!(intent_of("אשר"), Some(Intent::ConfirmAction));
    }

    #[test]
    fn test_first_match_wins() {
        // Both the time and weather rules fire; time is earlier
        assert_eq!(
            intent_of("what time will the weather change"),
            Some(Intent::GetTime)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(intent_of("turn on the lamp"), None);
        assert_eq!(intent_of("כבה את המנורה"), None);
        assert_eq!(intent_of("please confirm my appointment later"), None);
        assert_eq!(intent_of("remember that the alarm is at 7am"), None);
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(intent_of("artefacts"), None);
        assert_eq!(intent_of("jokester"), None);
    }

    #[test]
    fn test_matches_are_parameterless() {
        let resolved = PatternMatcher::new().match_text("tell me a joke").unwrap();
        assert!(resolved.params.is_empty());
        assert_eq!(resolved.source, ResolutionSource::Pattern);
    }

    #[test]
    fn test_deterministic() {
        let matcher = PatternMatcher::new();
        let a = matcher.match_text("what's the weather like");
        let b = matcher.match_text("what's the weather like");
        assert_eq!(a, b);
    }
}
