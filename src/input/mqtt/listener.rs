//! Enviro topic demultiplexer.
//!
//! Boards publish to `<prefix>/<device>`. Each message is decoded into a
//! [`Reading`], keyed by the board's hardware address (or the topic's device
//! segment when the board sends none), and handed to a single callback.

use super::client::{MqttClient, MqttMessage};
use crate::config::MqttConfig;
use crate::devices::Reading;
use crate::error::{BridgeError, Result};
use crate::platform::DeviceKey;
use log::{error, info, warn};
use serde::Deserialize;
use serde::de::Error as _;
use tokio_util::sync::CancellationToken;

/// Decode one Enviro message into its device key and reading.
pub fn parse_message(prefix: &str, topic: &str, payload: &[u8]) -> Result<(DeviceKey, Reading)> {
    let mut parts = topic.split('/');
    let first = parts.next().unwrap_or_default();
    if first != prefix {
        return Err(BridgeError::UnexpectedPrefix {
            expected: prefix.to_string(),
            found: first.to_string(),
        });
    }
    let device = parts.next();

    let text = std::str::from_utf8(payload).map_err(|source| BridgeError::InvalidUtf8 {
        topic: topic.to_string(),
        source,
    })?;
    let invalid = |source| BridgeError::InvalidPayload {
        topic: topic.to_string(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(text).map_err(invalid)?;
    if !value.is_object() {
        return Err(invalid(serde_json::Error::custom("expected a JSON object")));
    }
    let reading = Reading::deserialize(value).map_err(invalid)?;

    let key = DeviceKey::resolve(device, &reading)
        .ok_or_else(|| BridgeError::MissingDevice(topic.to_string()))?;
    Ok((key, reading))
}

/// Listens on `<prefix>/#` and forwards decoded readings.
pub struct EnviroListener {
    client: MqttClient,
    prefix: String,
}

impl EnviroListener {
    pub fn new(config: &MqttConfig) -> Self {
        let prefix = config.topic_prefix.clone();
        let client = MqttClient::new(config).with_subscription(format!("{}/#", prefix));
        Self { client, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run until `shutdown` is cancelled, calling `on_reading` for every
    /// valid message. Invalid messages are logged and dropped.
    pub async fn run<F>(self, shutdown: CancellationToken, mut on_reading: F)
    where
        F: FnMut(DeviceKey, Reading),
    {
        let prefix = self.prefix;
        self.client
            .run(shutdown, |msg: MqttMessage| {
                match parse_message(&prefix, &msg.topic, &msg.payload) {
                    Ok((key, reading)) => {
                        info!("[MQTT] got new reading on device {}", key);
                        on_reading(key, reading);
                    }
                    Err(e @ BridgeError::UnexpectedPrefix { .. }) => {
                        // only `prefix/#` is subscribed
                        error!("[MQTT] {}", e);
                    }
                    Err(e) => {
                        warn!("[MQTT] Dropping message: {}", e);
                    }
                }
            })
            .await;
    }
}
