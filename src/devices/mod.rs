//! Smart-device control
//!
//! Devices are addressed by the name users say ("lamp", "מזגן") and mapped to
//! MQTT topics in configuration. [`payload_for`] turns a [`DeviceCommand`]
//! into the wire payload for a device's component type.

mod mqtt;

use serde::{Deserialize, Serialize};

use crate::capabilities::DeviceCommand;
use crate::{Error, Result};

pub use mqtt::MqttDeviceController;

/// Kind of device, which decides the payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Light,
    Switch,
    Climate,
}

/// Topic mapping for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub component: Component,
    pub command_topic: String,
    #[serde(default)]
    pub state_topic: Option<String>,
}

/// Wire payload for a command sent to a component
///
/// # Errors
///
/// Returns `Error::Device` if the component does not support the command
pub fn payload_for(component: Component, command: DeviceCommand) -> Result<String> {
    match (component, command) {
        (Component::Light | Component::Switch, DeviceCommand::On) => Ok("ON".to_string()),
        (Component::Light | Component::Switch, DeviceCommand::Off) => Ok("OFF".to_string()),
        (Component::Light | Component::Switch, DeviceCommand::Toggle) => Ok("TOGGLE".to_string()),
        (Component::Light, DeviceCommand::Brightness(level)) => {
            Ok(serde_json::json!({ "brightness": level }).to_string())
        }
        (Component::Climate, DeviceCommand::Temperature(degrees)) => Ok(degrees.to_string()),
        (component, command) => Err(Error::Device(format!(
            "{component:?} does not support {command}"
        ))),
    }
}
