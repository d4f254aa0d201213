//! MQTT client wrapper for the Enviro telemetry topics.

use crate::config::MqttConfig;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay before polling again after a connection error. rumqttc reconnects on
/// the next poll.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Message received from MQTT broker.
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// MQTT client that keeps a fixed set of subscriptions alive across reconnects.
pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
    subscriptions: Vec<String>,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.as_deref().unwrap_or_default());
        }

        let (client, event_loop) = AsyncClient::new(options, 100);

        Self {
            client,
            event_loop,
            subscriptions: Vec::new(),
        }
    }

    /// Add a topic filter, subscribed on every (re)connection.
    pub fn with_subscription(mut self, topic: impl Into<String>) -> Self {
        self.subscriptions.push(topic.into());
        self
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    fn subscribe_all(&self) {
        for topic in &self.subscriptions {
            info!("[MQTT] Subscribing to {}", topic);
            if let Err(e) = self.client.try_subscribe(topic, QoS::AtMostOnce) {
                error!("[MQTT] failed subscribing to topic {}: {}", topic, e);
            }
        }
    }

    /// Run the MQTT event loop, handing every received publish to `on_message`.
    ///
    /// Messages are handled one at a time, inside the poll loop. Returns once
    /// `shutdown` is cancelled.
    pub async fn run<F>(mut self, shutdown: CancellationToken, mut on_message: F)
    where
        F: FnMut(MqttMessage),
    {
        info!("[MQTT] Starting event loop");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.event_loop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("[MQTT] Connected");
                    self.subscribe_all();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(
                        "[MQTT] Received {} bytes on {}",
                        publish.payload.len(),
                        publish.topic
                    );
                    on_message(MqttMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("[MQTT] Connection error: {:?}", e);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }

        if let Err(e) = self.client.try_disconnect() {
            debug!("[MQTT] Disconnect failed: {}", e);
        }
        info!("[MQTT] Event loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_run_returns_on_shutdown() {
        let mut config = Config::default().mqtt;
        config.broker_host = "127.0.0.1".to_string();
        config.broker_port = 1;
        let client = MqttClient::new(&config).with_subscription("enviro/#");
        assert_eq!(client.subscriptions(), ["enviro/#".to_string()]);

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let mut received = 0;
        tokio::time::timeout(
            Duration::from_secs(5),
            client.run(shutdown, |_| received += 1),
        )
        .await
        .expect("event loop did not stop");
        assert_eq!(received, 0);
    }
}
