//! Error types for Ziggy

use thiserror::Error;

/// Result type alias for Ziggy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Ziggy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Semantic classifier error (transport, malformed output, schema mismatch)
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Language model API error
    #[error("llm error: {0}")]
    Llm(String),

    /// Device control error
    #[error("device error: {0}")]
    Device(String),

    /// Memory store persistence error
    #[error("memory error: {0}")]
    Memory(String),

    /// File store error
    #[error("file store error: {0}")]
    FileStore(String),

    /// Task store error
    #[error("task error: {0}")]
    Task(String),

    /// External integration (webhook) error
    #[error("integration error: {0}")]
    Integration(String),

    /// Messaging channel error
    #[error("channel error: {0}")]
    Channel(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Process or host lifecycle error
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Resource not found (device, list item, task, file)
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected input (e.g. a file name escaping the store root)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
