//! Configuration management for Ziggy
//!
//! A single [`Config`] is built at startup and handed to constructors.
//! Precedence for every value: environment > TOML file > default.

pub mod file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::devices::DeviceConfig;
use crate::{Error, Result};

pub use file::ZiggyConfigFile;

/// Ziggy configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant name used in prompts and greetings
    pub assistant_name: String,

    /// Directory for memory, tasks, list and notes
    pub data_dir: PathBuf,

    /// Language model configuration
    pub llm: LlmConfig,

    /// Voice processing configuration
    pub voice: VoiceConfig,

    /// Telegram bridge configuration
    pub telegram: TelegramConfig,

    /// MQTT broker configuration
    pub mqtt: MqttConfig,

    /// Named devices
    pub devices: HashMap<String, DeviceConfig>,

    /// IFTTT Maker webhook key
    pub ifttt_key: Option<String>,

    /// Lifecycle gate configuration
    pub lifecycle: LifecycleConfig,
}

/// OpenAI-compatible chat model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key; without it the classifier degrades every miss to `unknown`
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on a single classification call
    pub timeout: Duration,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input
    pub enabled: bool,

    /// Wake phrases
    pub wake_words: Vec<String>,

    /// Whisper model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

/// Telegram bridge configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token; the bridge is disabled without one
    pub token: Option<String>,

    /// Authorized sender ids; empty allows everyone
    pub allowed_users: Vec<i64>,

    /// Back-off after a failed poll
    pub poll_interval: Duration,
}

/// MQTT broker configuration
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host; device control is unavailable without one
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
}

/// Lifecycle gate configuration
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Allow shutdown/reboot of the host machine
    pub allow_host_power: bool,

    /// How long a pending request waits for confirmation
    pub confirm_window: Duration,

    /// argv run to power the host off
    pub poweroff_command: Vec<String>,

    /// argv run to reboot the host
    pub reboot_command: Vec<String>,
}

/// Default wake phrases, English and Hebrew
pub const DEFAULT_WAKE_WORDS: &[&str] = &["hey ziggy", "ziggy", "היי זיגי", "הי זיגי"];

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 15;

impl Config {
    /// Load configuration from the environment and the TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a resulting value is unusable (e.g. an empty
    /// power-off command)
    pub fn load(path_override: Option<&Path>, disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file(path_override);
        let mut config = Self::from_sources(fc, |key| std::env::var(key).ok())?;

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
            config.voice.enabled = false;
        }

        if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
            tracing::warn!(
                path = %config.data_dir.display(),
                error = %e,
                "failed to create data directory"
            );
        }

        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a lifecycle command is empty
    pub fn from_sources(
        fc: ZiggyConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let assistant_name = fc.assistant.name.unwrap_or_else(|| "Ziggy".to_string());

        // Data directory (~/.local/share/ziggy on Linux)
        let data_dir = env("ZIGGY_DATA_DIR")
            .or(fc.storage.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        // LLM (env > toml > default)
        let llm = LlmConfig {
            api_key: env("OPENAI_API_KEY").or(fc.llm.api_key),
            base_url: env("ZIGGY_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: env("ZIGGY_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: fc.llm.temperature.unwrap_or(0.3),
            timeout: Duration::from_secs(
                env("ZIGGY_LLM_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .or(fc.llm.timeout_secs)
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            ),
        };

        let voice = VoiceConfig {
            enabled: fc.voice.enabled.unwrap_or(true),
            wake_words: fc
                .voice
                .wake_words
                .filter(|words| !words.is_empty())
                .unwrap_or_else(|| DEFAULT_WAKE_WORDS.iter().map(ToString::to_string).collect()),
            stt_model: fc.voice.stt_model.unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: fc.voice.tts_model.unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
        };

        let telegram = TelegramConfig {
            token: env("TELEGRAM_BOT_TOKEN").or(fc.telegram.token),
            allowed_users: env("ZIGGY_TELEGRAM_ALLOWED_USERS")
                .map(|s| parse_user_ids(&s))
                .or(fc.telegram.allowed_users)
                .unwrap_or_default(),
            poll_interval: Duration::from_secs(fc.telegram.poll_interval_secs.unwrap_or(5)),
        };

        let mqtt = MqttConfig {
            host: env("MQTT_HOST").or(fc.mqtt.host),
            port: env("MQTT_PORT")
                .and_then(|s| s.parse().ok())
                .or(fc.mqtt.port)
                .unwrap_or(1883),
            username: env("MQTT_USERNAME").or(fc.mqtt.username),
            password: env("MQTT_PASSWORD").or(fc.mqtt.password),
            client_id: fc.mqtt.client_id.unwrap_or_else(|| "ziggy".to_string()),
        };

        let lifecycle = LifecycleConfig {
            allow_host_power: env("ZIGGY_ALLOW_HOST_POWER")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.lifecycle.allow_host_power)
                .unwrap_or(false),
            confirm_window: Duration::from_secs(fc.lifecycle.confirm_window_secs.unwrap_or(30)),
            poweroff_command: fc
                .lifecycle
                .poweroff_command
                .unwrap_or_else(|| vec!["systemctl".to_string(), "poweroff".to_string()]),
            reboot_command: fc
                .lifecycle
                .reboot_command
                .unwrap_or_else(|| vec!["systemctl".to_string(), "reboot".to_string()]),
        };

        if lifecycle.poweroff_command.is_empty() || lifecycle.reboot_command.is_empty() {
            return Err(Error::Config(
                "lifecycle power commands must not be empty".to_string(),
            ));
        }

        Ok(Self {
            assistant_name,
            data_dir,
            llm,
            voice,
            telegram,
            mqtt,
            devices: fc.devices,
            ifttt_key: env("IFTTT_KEY").or(fc.ifttt.key),
            lifecycle,
        })
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from(".ziggy"), |d| d.data_dir().join("ziggy"))
}

fn parse_user_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(value = s, "ignoring invalid telegram user id");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(ZiggyConfigFile::default(), env_of(&[])).unwrap();
        assert_eq!(config.assistant_name, "Ziggy");
        assert_eq!(config.llm.timeout, Duration::from_secs(15));
        assert_eq!(config.mqtt.port, 1883);
        assert!(config.llm.api_key.is_none());
        assert!(!config.lifecycle.allow_host_power);
        assert_eq!(config.lifecycle.poweroff_command, ["systemctl", "poweroff"]);
        assert!(config.voice.wake_words.iter().any(|w| w == "היי זיגי"));
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: ZiggyConfigFile = toml::from_str(
            r#"
            [llm]
            model = "from-file"
            timeout_secs = 9

            [mqtt]
            host = "file-broker"
            port = 1884
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            fc,
            env_of(&[
                ("ZIGGY_LLM_MODEL", "from-env"),
                ("MQTT_PORT", "2883"),
                ("ZIGGY_ALLOW_HOST_POWER", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.llm.timeout, Duration::from_secs(9));
        assert_eq!(config.mqtt.host.as_deref(), Some("file-broker"));
        assert_eq!(config.mqtt.port, 2883);
        assert!(config.lifecycle.allow_host_power);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config =
            Config::from_sources(ZiggyConfigFile::default(), env_of(&[("ZIGGY_LLM_TIMEOUT_SECS", "0")]))
                .unwrap();
        assert_eq!(config.llm.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_allowed_users_from_env() {
        let config = Config::from_sources(
            ZiggyConfigFile::default(),
            env_of(&[("ZIGGY_TELEGRAM_ALLOWED_USERS", "123, 456,abc,")]),
        )
        .unwrap();
        assert_eq!(config.telegram.allowed_users, vec![123, 456]);
    }

    #[test]
    fn test_empty_power_command_rejected() {
        let fc: ZiggyConfigFile = toml::from_str(
            r"
            [lifecycle]
            poweroff_command = []
            ",
        )
        .unwrap();
        assert!(Config::from_sources(fc, env_of(&[])).is_err());
    }
}
