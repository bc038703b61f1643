//! Third-party service integrations

pub mod ifttt;

pub use ifttt::IftttClient;
