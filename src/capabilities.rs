//! Capability interfaces consumed by the dispatcher
//!
//! Each trait is one external collaborator. Implementations live in
//! [`crate::devices`], [`crate::files`], [`crate::tasks`],
//! [`crate::integrations`], [`crate::llm`] and [`crate::lifecycle`]; tests
//! substitute recording mocks.

use std::fmt;

use async_trait::async_trait;

use crate::intent::CompletionBackend;
use crate::lifecycle::{ConfirmOutcome, LifecycleAction, LifecycleDecision, Origin};
use crate::{Error, Result};

/// Command for a named device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    On,
    Off,
    Toggle,
    /// Brightness, 0-255
    Brightness(u8),
    /// Target temperature in degrees
    Temperature(f64),
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Toggle => f.write_str("toggle"),
            Self::Brightness(level) => write!(f, "brightness {level}"),
            Self::Temperature(degrees) => write!(f, "temperature {degrees}"),
        }
    }
}

/// Smart-device control
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Send a command to a named device
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown device, or `Error::Device` if
    /// the command cannot be delivered
    async fn control(&self, device: &str, command: DeviceCommand) -> Result<()>;

    /// Turn a device on
    ///
    /// # Errors
    ///
    /// See [`DeviceControl::control`]
    async fn turn_on(&self, device: &str) -> Result<()> {
        self.control(device, DeviceCommand::On).await
    }

    /// Turn a device off
    ///
    /// # Errors
    ///
    /// See [`DeviceControl::control`]
    async fn turn_off(&self, device: &str) -> Result<()> {
        self.control(device, DeviceCommand::Off).await
    }
}

/// Shopping list and note files
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Append an item to the list
    ///
    /// # Errors
    ///
    /// Returns `Error::FileStore` on write failure
    async fn add_to_list(&self, item: &str) -> Result<()>;

    /// Remove an item from the list
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the item is not on the list
    async fn remove_from_list(&self, item: &str) -> Result<()>;

    /// Read a named file
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for a missing file or `Error::InvalidInput`
    /// for a name outside the store
    async fn read(&self, name: &str) -> Result<String>;

    /// Replace the content of a named file
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a name outside the store, or
    /// `Error::FileStore` on write failure
    async fn write(&self, name: &str, content: &str) -> Result<()>;
}

/// Tasks and reminders
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Record a task due at a free-form time
    ///
    /// # Errors
    ///
    /// Returns `Error::Task` on persistence failure
    async fn create_task(&self, description: &str, when: &str) -> Result<()>;

    /// Remove a task by description
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no task matches
    async fn cancel_task(&self, description: &str) -> Result<()>;
}

/// Webhook-style event trigger
#[async_trait]
pub trait EventTrigger: Send + Sync {
    /// Fire a named event with an optional value
    ///
    /// # Errors
    ///
    /// Returns `Error::Integration` if the trigger is rejected
    async fn trigger(&self, event: &str, value: Option<&str>) -> Result<()>;
}

/// Free-form question answering
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Answer a question in natural language
    ///
    /// # Errors
    ///
    /// Returns error if no answer can be obtained
    async fn answer(&self, question: &str) -> Result<String>;
}

/// The narrow lifecycle interface: request, then confirm
pub trait SystemLifecycle: Send + Sync {
    /// Park a lifecycle action until it is confirmed
    fn request(&self, action: LifecycleAction, origin: &Origin) -> LifecycleDecision;

    /// Confirm the action pending for `origin`
    fn confirm(&self, origin: &Origin) -> ConfirmOutcome;
}

/// Stand-in for a capability that is not configured
///
/// Every call fails with `Error::Config` naming what is missing, which the
/// dispatcher turns into an apology.
#[derive(Debug, Clone, Copy)]
pub struct Unavailable(pub &'static str);

impl Unavailable {
    fn error(self) -> Error {
        Error::Config(format!("{} is not configured", self.0))
    }
}

#[async_trait]
impl DeviceControl for Unavailable {
    async fn control(&self, _device: &str, _command: DeviceCommand) -> Result<()> {
        Err(self.error())
    }
}

#[async_trait]
impl EventTrigger for Unavailable {
    async fn trigger(&self, _event: &str, _value: Option<&str>) -> Result<()> {
        Err(self.error())
    }
}

#[async_trait]
impl KnowledgeSource for Unavailable {
    async fn answer(&self, _question: &str) -> Result<String> {
        Err(self.error())
    }
}

#[async_trait]
impl CompletionBackend for Unavailable {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Err(self.error())
    }
}
