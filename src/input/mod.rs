//! Input sources for the bridge.
//!
//! Current input sources:
//! - `mqtt`: Enviro boards publishing JSON readings to an MQTT broker

pub mod mqtt;
