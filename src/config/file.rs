//! TOML configuration file loading
//!
//! Supports `~/.config/ziggy/config.toml` (or an explicit `--config` path) as
//! a persistent config source. Every field is optional; the file is a partial
//! overlay on top of defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::devices::DeviceConfig;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ZiggyConfigFile {
    /// Assistant persona settings
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Language model used by the classifier and knowledge fallback
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Telegram bridge
    #[serde(default)]
    pub telegram: TelegramFileConfig,

    /// MQTT broker connection
    #[serde(default)]
    pub mqtt: MqttFileConfig,

    /// Named devices, keyed by the name users say
    #[serde(default)]
    pub devices: HashMap<String, DeviceConfig>,

    /// IFTTT webhooks
    #[serde(default)]
    pub ifttt: IftttFileConfig,

    /// Process and host lifecycle
    #[serde(default)]
    pub lifecycle: LifecycleFileConfig,

    /// On-disk storage
    #[serde(default)]
    pub storage: StorageFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Name used in prompts and greetings (e.g. "Ziggy")
    pub name: Option<String>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL (e.g. "https://api.openai.com")
    pub base_url: Option<String>,

    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    pub temperature: Option<f32>,

    /// Classification timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// Wake phrases, any language
    pub wake_words: Option<Vec<String>>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TelegramFileConfig {
    pub token: Option<String>,

    /// Telegram user ids allowed to issue commands (empty = everyone)
    pub allowed_users: Option<Vec<i64>>,

    /// Delay between polls after an error, in seconds
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MqttFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IftttFileConfig {
    /// Maker webhook key
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LifecycleFileConfig {
    /// Allow shutdown/reboot of the host machine
    pub allow_host_power: Option<bool>,

    /// How long a lifecycle request waits for confirmation, in seconds
    pub confirm_window_secs: Option<u64>,

    /// Command run to power off the host, as argv
    pub poweroff_command: Option<Vec<String>>,

    /// Command run to reboot the host, as argv
    pub reboot_command: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageFileConfig {
    /// Directory for memory, tasks, list and notes
    pub data_dir: Option<String>,
}

/// Load the TOML config file
///
/// Uses `path_override` when given, otherwise the standard path. Returns
/// `ZiggyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path_override: Option<&Path>) -> ZiggyConfigFile {
    let Some(path) = path_override.map(Path::to_path_buf).or_else(config_file_path) else {
        return ZiggyConfigFile::default();
    };

    if !path.exists() {
        if path_override.is_some() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
        return ZiggyConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ZiggyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ZiggyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/ziggy/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("ziggy").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Component;

    #[test]
    fn test_parse_full_file() {
        let content = r#"
            [assistant]
            name = "Ziggy"

            [llm]
            model = "gpt-4o-mini"
            timeout_secs = 10

            [telegram]
            allowed_users = [12345, 67890]

            [devices.lamp]
            component = "light"
            command_topic = "home/lamp/set"
            state_topic = "home/lamp/state"

            [lifecycle]
            allow_host_power = true
            reboot_command = ["sudo", "reboot"]
        "#;

        let fc: ZiggyConfigFile = toml::from_str(content).unwrap();
        assert_eq!(fc.assistant.name.as_deref(), Some("Ziggy"));
        assert_eq!(fc.llm.timeout_secs, Some(10));
        assert_eq!(fc.telegram.allowed_users, Some(vec![12345, 67890]));
        assert_eq!(fc.devices["lamp"].component, Component::Light);
        assert_eq!(fc.lifecycle.allow_host_power, Some(true));
        assert!(fc.mqtt.host.is_none());
    }

    #[test]
    fn test_empty_file_is_default() {
        let fc: ZiggyConfigFile = toml::from_str("").unwrap();
        assert!(fc.devices.is_empty());
        assert!(fc.voice.enabled.is_none());
    }

    #[test]
    fn test_unparseable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is [not toml").unwrap();

        let fc = load_config_file(Some(&path));
        assert!(fc.assistant.name.is_none());
    }

    #[test]
    fn test_missing_override_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file(Some(&dir.path().join("absent.toml")));
        assert!(fc.devices.is_empty());
    }
}
