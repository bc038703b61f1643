//! MQTT device controller

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::watch;

use super::{DeviceConfig, payload_for};
use crate::capabilities::{DeviceCommand, DeviceControl};
use crate::config::MqttConfig;
use crate::{Error, Result};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Capacity of the client's outgoing request queue
const REQUEST_QUEUE: usize = 10;

/// Publishes device commands to an MQTT broker
///
/// Publishing never waits: commands fail with `Error::Device` while the
/// broker is disconnected or the request queue is full.
pub struct MqttDeviceController {
    client: AsyncClient,
    devices: HashMap<String, DeviceConfig>,
    /// Set on ConnAck, cleared on connection errors
    connected: Arc<AtomicBool>,
}

impl MqttDeviceController {
    /// Connect to the broker and drive its event loop in the background
    ///
    /// State topics are (re)subscribed on every connection acknowledgement.
    /// The event loop stops when `shutdown` flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no broker host is configured
    pub fn connect(
        config: &MqttConfig,
        devices: HashMap<String, DeviceConfig>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| Error::Config("MQTT_HOST not set".to_string()))?;

        let mut opts = MqttOptions::new(&config.client_id, host, config.port);
        opts.set_keep_alive(Duration::from_secs(60));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            opts.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(opts, REQUEST_QUEUE);
        let controller = Self::with_client(client, devices);

        tracing::info!(host, port = config.port, devices = controller.devices.len(), "connecting to MQTT broker");
        tokio::spawn(run_event_loop(
            event_loop,
            controller.client.clone(),
            controller.state_topics(),
            Arc::clone(&controller.connected),
            shutdown,
        ));

        Ok(controller)
    }

    fn with_client(client: AsyncClient, devices: HashMap<String, DeviceConfig>) -> Self {
        let devices = devices
            .into_iter()
            .map(|(name, device)| (name.trim().to_lowercase(), device))
            .collect();
        Self {
            client,
            devices,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    fn state_topics(&self) -> Vec<String> {
        self.devices
            .values()
            .filter_map(|d| d.state_topic.clone())
            .collect()
    }

    /// Send a DISCONNECT to the broker
    pub fn disconnect(&self) {
        if let Err(e) = self.client.try_disconnect() {
            tracing::debug!(error = %e, "MQTT disconnect failed");
        }
    }
}

#[async_trait]
impl DeviceControl for MqttDeviceController {
    async fn control(&self, device: &str, command: DeviceCommand) -> Result<()> {
        let config = self
            .devices
            .get(&device.trim().to_lowercase())
            .ok_or_else(|| Error::NotFound(format!("device '{device}'")))?;

        let payload = payload_for(config.component, command)?;

        if !self.connected.load(Ordering::Acquire) {
            return Err(Error::Device(format!(
                "MQTT broker not connected, {device} not reached"
            )));
        }

        self.client
            .try_publish(&config.command_topic, QoS::AtLeastOnce, false, payload.clone())
            .map_err(|e| Error::Device(format!("publish to {} failed: {e}", config.command_topic)))?;

        tracing::info!(device, topic = %config.command_topic, %payload, "device command sent");
        Ok(())
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    state_topics: Vec<String>,
    connected: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::debug!("MQTT event loop stopping");
                break;
            }
            notification = event_loop.poll() => match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("MQTT connected");
                    connected.store(true, Ordering::Release);
                    for topic in &state_topics {
                        // try_subscribe: this task is the one draining the request queue
                        if let Err(e) = client.try_subscribe(topic, QoS::AtMostOnce) {
                            tracing::warn!(topic, error = %e, "failed to subscribe to state topic");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    tracing::debug!(
                        topic = %publish.topic,
                        payload = %String::from_utf8_lossy(&publish.payload),
                        "device state update"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    connected.store(false, Ordering::Release);
                    tracing::warn!(error = %e, "MQTT connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Component;

    fn controller() -> (MqttDeviceController, EventLoop) {
        let (client, event_loop) = AsyncClient::new(MqttOptions::new("test", "localhost", 1883), REQUEST_QUEUE);
        let devices = HashMap::from([
            (
                "Lamp".to_string(),
                DeviceConfig {
                    component: Component::Light,
                    command_topic: "home/lamp/set".to_string(),
                    state_topic: Some("home/lamp/state".to_string()),
                },
            ),
            (
                "heater".to_string(),
                DeviceConfig {
                    component: Component::Climate,
                    command_topic: "home/heater/set".to_string(),
                    state_topic: None,
                },
            ),
        ]);
        (MqttDeviceController::with_client(client, devices), event_loop)
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let (controller, _event_loop) = controller();
        let err = controller.turn_on("toaster").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unsupported_command() {
        let (controller, _event_loop) = controller();
        let err = controller.control("heater", DeviceCommand::Toggle).await.unwrap_err();
        assert!(matches!(err, Error::Device(_)));
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_without_blocking() {
        let (controller, _event_loop) = controller();

        for _ in 0..REQUEST_QUEUE + 2 {
            let result = tokio::time::timeout(Duration::from_secs(2), controller.turn_on("lamp"))
                .await
                .expect("control must not block");
            assert!(matches!(result, Err(Error::Device(_))));
        }
    }

    #[tokio::test]
    async fn test_full_request_queue_fails_without_blocking() {
        let (controller, _event_loop) = controller();
        controller.connected.store(true, Ordering::Release);

        for _ in 0..REQUEST_QUEUE {
            controller.turn_on("LAMP").await.unwrap();
        }

        let result = tokio::time::timeout(Duration::from_secs(2), controller.turn_off("lamp"))
            .await
            .expect("control must not block");
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Device(_)));
        assert!(err.to_string().contains("home/lamp/set"));
    }

    #[test]
    fn test_state_topics() {
        let (controller, _event_loop) = controller();
        assert_eq!(controller.state_topics(), vec!["home/lamp/state".to_string()]);
    }
}
