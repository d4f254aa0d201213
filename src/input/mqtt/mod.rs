//! MQTT input source for Enviro boards.
//!
//! This module provides the MQTT client and the topic demultiplexer that turns
//! Enviro telemetry into per-device readings.

mod client;
mod listener;

pub use client::{MqttClient, MqttMessage};
pub use listener::{EnviroListener, parse_message};
