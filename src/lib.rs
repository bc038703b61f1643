//! Ziggy - bilingual voice and messaging home assistant
//!
//! This library provides the core of the Ziggy assistant:
//! - Intent resolution (deterministic patterns, then an LLM classifier)
//! - Command dispatch to devices, files, tasks, memory and events
//! - Voice loop (wake word, STT, TTS) and a Telegram bridge
//! - Confirmed lifecycle control (exit, restart, host power)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        Voice (wake word)   │   Telegram   │  CLI    │
//! └────────────────────┬────────────────────────────────┘
//!                      │ text + language
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Command Router                       │
//! │   Pattern Matcher  →  Semantic Classifier (LLM)     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ (intent, params)
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Dispatcher                         │
//! │  MQTT devices │ files │ tasks │ memory │ IFTTT │ ... │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod capabilities;
pub mod channels;
pub mod config;
pub mod daemon;
pub mod devices;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod integrations;
pub mod intent;
pub mod lifecycle;
pub mod llm;
pub mod locale;
pub mod memory;
pub mod router;
pub mod tasks;
pub mod voice;

pub use config::Config;
pub use daemon::{Assistant, Daemon};
pub use dispatch::{Capabilities, Dispatcher};
pub use error::{Error, Result};
pub use intent::{Intent, IntentResolver, Params, ResolvedIntent};
pub use lifecycle::{LifecycleAction, LifecycleGate, Origin};
pub use locale::{Language, Reply};
pub use memory::MemoryStore;
pub use router::CommandRouter;
