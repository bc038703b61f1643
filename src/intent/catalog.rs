//! Intent catalog
//!
//! The fixed set of intents and their parameter schemas. The same catalog is
//! rendered into the classifier prompt and used to validate classifier
//! output, and [`Intent::spec`] is an exhaustive match, so an intent cannot
//! exist without a schema.

use std::fmt::Write;

use serde_json::{Map, Value};

use super::{Intent, Params};
use crate::{Error, Result};

use self::ParamType::{Number, OneOf, Str};

/// Device actions understood by `control_device`
pub const DEVICE_ACTIONS: &[&str] = &["on", "off", "toggle", "set_brightness", "set_temperature"];

/// Type of a single intent parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Free-form string
    Str,
    /// Number (numeric strings accepted)
    Number,
    /// One of a fixed set of lower-case literals
    OneOf(&'static [&'static str]),
}

/// Schema entry for one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
}

impl ParamSpec {
    const fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    const fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// Catalog entry: an intent and its parameter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentSpec {
    pub intent: Intent,
    pub params: &'static [ParamSpec],
}

impl IntentSpec {
    /// Look up a parameter schema by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

const NO_PARAMS: &[ParamSpec] = &[];
const WEATHER: &[ParamSpec] = &[ParamSpec::optional("location", Str)];
const CONTROL_DEVICE: &[ParamSpec] = &[
    ParamSpec::required("device", Str),
    ParamSpec::required("action", OneOf(DEVICE_ACTIONS)),
    ParamSpec::optional("value", Number),
];
const LIST_ITEM: &[ParamSpec] = &[ParamSpec::required("item", Str)];
const CREATE_TASK: &[ParamSpec] = &[
    ParamSpec::required("description", Str),
    ParamSpec::required("when", Str),
];
const CANCEL_TASK: &[ParamSpec] = &[ParamSpec::required("description", Str)];
const ASK_MEMORY: &[ParamSpec] = &[ParamSpec::required("topic", Str)];
const SAVE_MEMORY: &[ParamSpec] = &[
    ParamSpec::required("topic", Str),
    ParamSpec::required("content", Str),
];
const READ_FILE: &[ParamSpec] = &[ParamSpec::required("filename", Str)];
const WRITE_FILE: &[ParamSpec] = &[
    ParamSpec::required("filename", Str),
    ParamSpec::required("content", Str),
];
const GENERATE_IDEA: &[ParamSpec] = &[ParamSpec::optional("topic", Str)];
const RUN_IFTTT: &[ParamSpec] = &[
    ParamSpec::required("event", Str),
    ParamSpec::optional("value1", Str),
];
const SWITCH_MODE: &[ParamSpec] = &[ParamSpec::required("mode", Str)];
const ASK_BUDDY: &[ParamSpec] = &[ParamSpec::optional("question", Str)];
const SET_REMINDER: &[ParamSpec] = &[
    ParamSpec::required("message", Str),
    ParamSpec::required("when", Str),
];
const PLAY_MUSIC: &[ParamSpec] = &[ParamSpec::optional("song", Str)];
const ASK_HEALTH: &[ParamSpec] = &[ParamSpec::required("issue", Str)];
const TRANSLATE: &[ParamSpec] = &[
    ParamSpec::required("text", Str),
    ParamSpec::required("target_lang", Str),
];

impl Intent {
    /// Parameter schema for this intent
    #[must_use]
    pub const fn spec(self) -> IntentSpec {
        let params = match self {
            Self::GetTime
            | Self::GetDate
            | Self::TellJoke
            | Self::TellFact
            | Self::GetStatus
            | Self::Exit
            | Self::Restart
            | Self::DebugDiagnostics
            | Self::ShutdownSystem
            | Self::RebootSystem
            | Self::ConfirmAction
            | Self::Unknown => NO_PARAMS,
            Self::GetWeather => WEATHER,
            Self::ControlDevice => CONTROL_DEVICE,
            Self::AddToList | Self::RemoveFromList => LIST_ITEM,
            Self::CreateTask => CREATE_TASK,
            Self::CancelTask => CANCEL_TASK,
            Self::AskMemory => ASK_MEMORY,
            Self::SaveMemory => SAVE_MEMORY,
            Self::ReadFile => READ_FILE,
            Self::WriteFile => WRITE_FILE,
            Self::GenerateIdea => GENERATE_IDEA,
            Self::RunIfttt => RUN_IFTTT,
            Self::SwitchMode => SWITCH_MODE,
            Self::AskBuddy => ASK_BUDDY,
            Self::SetReminder => SET_REMINDER,
            Self::PlayMusic => PLAY_MUSIC,
            Self::AskHealth => ASK_HEALTH,
            Self::Translate => TRANSLATE,
        };
        IntentSpec {
            intent: self,
            params,
        }
    }
}

/// Render the catalog as `name → {schema}` lines for the classifier prompt
#[must_use]
pub fn render_catalog() -> String {
    let mut out = String::new();
    for intent in Intent::ALL {
        let spec = intent.spec();
        let fields: Vec<String> = spec.params.iter().map(render_param).collect();
        let _ = writeln!(out, "- {} → {{{}}}", intent.as_str(), fields.join(", "));
    }
    out
}

fn render_param(param: &ParamSpec) -> String {
    let ty = match param.ty {
        Str => "str".to_string(),
        Number => "number".to_string(),
        OneOf(options) => options
            .iter()
            .map(|o| format!("\"{o}\""))
            .collect::<Vec<_>>()
            .join("|"),
    };
    if param.required {
        format!("\"{}\": {ty}", param.name)
    } else {
        format!("\"{}\": {ty} (optional)", param.name)
    }
}

/// Validate untrusted parameters against an intent's schema
///
/// Nulls count as absent and unknown keys are dropped. Missing required
/// parameters are allowed through; the dispatcher asks for them.
///
/// # Errors
///
/// Returns `Error::Classifier` if a present parameter has the wrong type
pub fn validate_params(intent: Intent, raw: Map<String, Value>) -> Result<Params> {
    let spec = intent.spec();
    let mut clean = Map::new();

    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        let Some(param) = spec.param(&key) else {
            tracing::debug!(intent = %intent, param = %key, "dropping parameter outside schema");
            continue;
        };
        let value = check_type(param, value).ok_or_else(|| {
            Error::Classifier(format!(
                "parameter '{key}' of '{intent}' does not match schema"
            ))
        })?;
        clean.insert(key, value);
    }

    Ok(Params::from(clean))
}

fn check_type(param: &ParamSpec, value: Value) -> Option<Value> {
    match (param.ty, value) {
        (Str, Value::String(s)) => Some(Value::String(s)),
        (Number, Value::Number(n)) => Some(Value::Number(n)),
        (Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        (OneOf(options), Value::String(s)) => {
            let lower = s.trim().to_lowercase();
            options
                .contains(&lower.as_str())
                .then_some(Value::String(lower))
        }
        _ => None,
    }
}
