//! Enviro MQTT bridge library.
//!
//! Routes Pimoroni Enviro telemetry published over MQTT onto cached
//! home-automation accessories, one accessory per physical board.

pub mod accessory;
pub mod cache_lock;
pub mod config;
pub mod devices;
pub mod error;
pub mod input;
pub mod platform;
