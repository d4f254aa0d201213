//! Diagnostic binary for Enviro MQTT traffic.
//!
//! Usage:
//!   cargo run --bin enviro-dump
//!
//! Connects to the broker, subscribes to the Enviro prefix and logs how every
//! reading would be routed (device key and board kind) without creating any
//! accessories.

use enviro_mqtt_bridge::config::{Config, load_dotenv};
use enviro_mqtt_bridge::devices::DeviceKind;
use enviro_mqtt_bridge::input::mqtt::EnviroListener;
use log::info;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    load_dotenv();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    info!(
        "Listening on {}:{} for {}/#",
        config.mqtt.broker_host, config.mqtt.broker_port, config.mqtt.topic_prefix
    );

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down...");
        shutdown_signal.cancel();
    });

    let mut seen: HashMap<String, usize> = HashMap::new();
    EnviroListener::new(&config.mqtt)
        .run(shutdown, |key, reading| {
            let count = seen.entry(key.id().to_string()).or_default();
            *count += 1;
            info!(
                ">>> {} #{}: {} temp={:?} humidity={:?} pressure={:?} at {}",
                key,
                count,
                DeviceKind::classify(&reading),
                reading.temperature,
                reading.humidity,
                reading.pressure,
                reading.timestamp.as_deref().unwrap_or("-")
            );
        })
        .await;

    info!("Saw {} device(s)", seen.len());
}
