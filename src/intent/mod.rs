//! Intent resolution pipeline
//!
//! Raw text is resolved to an [`Intent`] plus [`Params`] in two stages: the
//! deterministic [`PatternMatcher`] first, then the LLM-backed
//! [`SemanticClassifier`] as a fallback. The [`catalog`] is the contract
//! between the classifier prompt and the dispatcher.

pub mod catalog;
mod classifier;
mod patterns;
mod resolver;

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

pub use catalog::{IntentSpec, ParamSpec, ParamType, render_catalog, validate_params};
pub use classifier::{Classifier, CompletionBackend, SemanticClassifier, parse_classifier_output};
pub use patterns::PatternMatcher;
pub use resolver::IntentResolver;

/// A named user goal the assistant can act on
///
/// Every variant except [`Intent::Unknown`] is a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    GetTime,
    GetDate,
    GetWeather,
    ControlDevice,
    AddToList,
    RemoveFromList,
    CreateTask,
    CancelTask,
    AskMemory,
    SaveMemory,
    ReadFile,
    WriteFile,
    TellJoke,
    TellFact,
    GenerateIdea,
    GetStatus,
    Exit,
    Restart,
    RunIfttt,
    SwitchMode,
    AskBuddy,
    SetReminder,
    PlayMusic,
    AskHealth,
    DebugDiagnostics,
    Translate,
    ShutdownSystem,
    RebootSystem,
    ConfirmAction,
    /// Terminal catch-all for anything that could not be classified
    Unknown,
}

impl Intent {
    /// Every catalog intent, in prompt order (excludes `Unknown`)
    pub const ALL: [Self; 29] = [
        Self::GetTime,
        Self::GetDate,
        Self::GetWeather,
        Self::ControlDevice,
        Self::AddToList,
        Self::RemoveFromList,
        Self::CreateTask,
        Self::CancelTask,
        Self::AskMemory,
        Self::SaveMemory,
        Self::ReadFile,
        Self::WriteFile,
        Self::TellJoke,
        Self::TellFact,
        Self::GenerateIdea,
        Self::GetStatus,
        Self::Exit,
        Self::Restart,
        Self::RunIfttt,
        Self::SwitchMode,
        Self::AskBuddy,
        Self::SetReminder,
        Self::PlayMusic,
        Self::AskHealth,
        Self::DebugDiagnostics,
        Self::Translate,
        Self::ShutdownSystem,
        Self::RebootSystem,
        Self::ConfirmAction,
    ];

    /// Wire name used in the classifier prompt and output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetTime => "get_time",
            Self::GetDate => "get_date",
            Self::GetWeather => "get_weather",
            Self::ControlDevice => "control_device",
            Self::AddToList => "add_to_list",
            Self::RemoveFromList => "remove_from_list",
            Self::CreateTask => "create_task",
            Self::CancelTask => "cancel_task",
            Self::AskMemory => "ask_memory",
            Self::SaveMemory => "save_memory",
            Self::ReadFile => "read_file",
            Self::WriteFile => "write_file",
            Self::TellJoke => "tell_joke",
            Self::TellFact => "tell_fact",
            Self::GenerateIdea => "generate_idea",
            Self::GetStatus => "get_status",
            Self::Exit => "exit",
            Self::Restart => "restart",
            Self::RunIfttt => "run_ifttt",
            Self::SwitchMode => "switch_mode",
            Self::AskBuddy => "ask_buddy",
            Self::SetReminder => "set_reminder",
            Self::PlayMusic => "play_music",
            Self::AskHealth => "ask_health",
            Self::DebugDiagnostics => "debug_diagnostics",
            Self::Translate => "translate",
            Self::ShutdownSystem => "shutdown_system",
            Self::RebootSystem => "reboot_system",
            Self::ConfirmAction => "confirm_action",
            Self::Unknown => "unknown",
        }
    }

    /// Look up a catalog intent by wire name
    ///
    /// Returns `None` for names outside the catalog, including "unknown".
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name == "ifttt_trigger" {
            return Some(Self::RunIfttt);
        }
        Self::ALL.into_iter().find(|intent| intent.as_str() == name)
    }

    /// Process- or host-level lifecycle intents, which go through the
    /// confirmation gate instead of acting directly
    #[must_use]
    pub const fn is_lifecycle(self) -> bool {
        matches!(
            self,
            Self::Exit | Self::Restart | Self::ShutdownSystem | Self::RebootSystem
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Intent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Intent parameters as produced by classification
///
/// Keys are not guaranteed to satisfy the catalog schema, so accessors
/// return `Option` and treat blank strings as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Non-blank string parameter, trimmed
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numeric parameter; numeric strings are accepted
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON map
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Which stage of the pipeline produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Deterministic keyword/regex rule
    Pattern,
    /// Semantic classifier, output validated against the catalog
    Classifier,
    /// Classifier failed; degraded to `unknown`
    Fallback,
}

/// The normalized (intent, parameters) pair produced once per utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIntent {
    pub intent: Intent,
    pub params: Params,
    pub source: ResolutionSource,
}

impl ResolvedIntent {
    /// Resolution with explicit parameters
    #[must_use]
    pub const fn new(intent: Intent, params: Params, source: ResolutionSource) -> Self {
        Self {
            intent,
            params,
            source,
        }
    }

    /// The degraded `unknown` terminal
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(Intent::Unknown, Params::new(), ResolutionSource::Fallback)
    }
}
