//! Bilingual locale handling
//!
//! Ziggy speaks Hebrew (primary) and English (secondary). Every reply is
//! produced in both languages and the caller's language picks one.

use std::fmt;

/// Language of an utterance or reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// Primary locale
    Hebrew,
    /// Secondary locale
    #[default]
    English,
}

impl Language {
    /// Short language tag ("he" / "en")
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Hebrew => "he",
            Self::English => "en",
        }
    }

    /// Parse a language tag or name, as returned by STT services
    ///
    /// Accepts "he", "iw", "he-IL", "hebrew", "en", "en-US", "english".
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_lowercase();
        let base = lower.split(['-', '_']).next().unwrap_or_default();
        match base {
            "he" | "iw" | "hebrew" => Some(Self::Hebrew),
            "en" | "english" => Some(Self::English),
            _ => None,
        }
    }

    /// Infer the language of a piece of text from its script
    ///
    /// Any Hebrew letter makes the text Hebrew; everything else is English.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_hebrew_letter) {
            Self::Hebrew
        } else {
            Self::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

const fn is_hebrew_letter(c: char) -> bool {
    matches!(c, '\u{05D0}'..='\u{05EA}' | '\u{FB1D}'..='\u{FB4F}')
}

/// A user-facing reply in both locales
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    hebrew: String,
    english: String,
}

impl Reply {
    /// Create a reply from its Hebrew and English renderings
    #[must_use]
    pub fn new(hebrew: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            hebrew: hebrew.into(),
            english: english.into(),
        }
    }

    /// Same text in both locales (e.g. a remembered note or model answer)
    #[must_use]
    pub fn verbatim(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            hebrew: text.clone(),
            english: text,
        }
    }

    /// Select the rendering for a language
    #[must_use]
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Hebrew => &self.hebrew,
            Language::English => &self.english,
        }
    }

    /// Consume the reply, keeping one rendering
    #[must_use]
    pub fn into_text(self, language: Language) -> String {
        match language {
            Language::Hebrew => self.hebrew,
            Language::English => self.english,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(Language::detect("what time is it"), Language::English);
        assert_eq!(Language::detect("מה השעה"), Language::Hebrew);
        assert_eq!(Language::detect("turn on the מנורה"), Language::Hebrew);
        assert_eq!(Language::detect(""), Language::English);
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(Language::from_tag("he-IL"), Some(Language::Hebrew));
        assert_eq!(Language::from_tag("iw"), Some(Language::Hebrew));
        assert_eq!(Language::from_tag("Hebrew"), Some(Language::Hebrew));
        assert_eq!(Language::from_tag("en_US"), Some(Language::English));
        assert_eq!(Language::from_tag("french"), None);
    }

    #[test]
    fn test_reply_selects_language() {
        let reply = Reply::new("שלום", "Hello");
        assert_eq!(reply.text(Language::Hebrew), "שלום");
        assert_eq!(reply.text(Language::English), "Hello");
        assert_eq!(reply.into_text(Language::English), "Hello");
    }
}
