//! Accessory model consumed by the bridge.
//!
//! Mirrors the slice of a home-automation host that the Enviro platform needs:
//! accessories identified by a stable UUID, each exposing typed services that
//! carry characteristic values. The host itself sits behind [`AccessoryHost`];
//! [`AccessoryStore`] is the shipped implementation that caches accessories
//! on disk between runs.

mod platform_accessory;
mod service;
pub mod store;

pub use platform_accessory::{Accessory, AccessoryRecord};
pub use service::{CharacteristicRecord, Service, ServiceRecord};
pub use store::AccessoryStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, IntoStaticStr};
use uuid::Uuid;

/// Namespace for accessory UUIDs derived from device keys.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x5d2c_84a1_6f3e_4b0a_9c71_e2a4_0f8d_1b36);

/// Derive the stable accessory id for a device key.
///
/// The same key always maps to the same UUID, so a cached accessory is found
/// again after a restart.
pub fn stable_id(key: &str) -> Uuid {
    Uuid::new_v5(&ACCESSORY_NAMESPACE, key.as_bytes())
}

/// Service types exposed by Enviro accessories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum ServiceType {
    AccessoryInformation,
    TemperatureSensor,
    HumiditySensor,
    AirPressureSensor,
    LightSensor,
    Lightbulb,
    AirQualitySensor,
    Switch,
}

/// Characteristics written by the device handlers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    IntoStaticStr,
)]
pub enum Characteristic {
    Name,
    Manufacturer,
    Model,
    SerialNumber,
    CurrentTemperature,
    CurrentRelativeHumidity,
    AirPressure,
    CurrentAmbientLightLevel,
    ColorTemperature,
    AirQuality,
    #[strum(serialize = "PM2_5Density")]
    #[serde(rename = "PM2_5Density")]
    Pm2_5Density,
    #[strum(serialize = "PM10Density")]
    #[serde(rename = "PM10Density")]
    Pm10Density,
    On,
}

/// Value held by a characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CharacteristicValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CharacteristicValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CharacteristicValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacteristicValue::Bool(b) => write!(f, "{}", b),
            CharacteristicValue::Number(n) => write!(f, "{}", n),
            CharacteristicValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        CharacteristicValue::Number(value)
    }
}

impl From<u8> for CharacteristicValue {
    fn from(value: u8) -> Self {
        CharacteristicValue::Number(value.into())
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        CharacteristicValue::Bool(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        CharacteristicValue::Text(value.to_string())
    }
}

impl From<String> for CharacteristicValue {
    fn from(value: String) -> Self {
        CharacteristicValue::Text(value)
    }
}

/// The host side of the bridge: where accessories live.
///
/// The platform only looks accessories up by id and registers new ones;
/// everything else happens on the returned [`Accessory`] handles.
pub trait AccessoryHost {
    /// Find a known (restored or registered) accessory by its stable id.
    fn find_accessory(&self, uuid: &Uuid) -> Option<Arc<Accessory>>;

    /// Register newly created accessories with the host.
    fn register_accessories(&self, accessories: &[Arc<Accessory>]);

    /// Find the accessory for `uuid`, creating an unregistered one if the host
    /// does not know it. The flag is `true` when the accessory was created.
    fn find_or_create_accessory(&self, display_name: &str, uuid: Uuid) -> (Arc<Accessory>, bool) {
        match self.find_accessory(&uuid) {
            Some(accessory) => (accessory, false),
            None => (Arc::new(Accessory::new(display_name, uuid)), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_id_is_deterministic() {
        assert_eq!(stable_id("e6:61:64:08:0b:2c"), stable_id("e6:61:64:08:0b:2c"));
        assert_ne!(stable_id("greenhouse"), stable_id("kitchen"));
        assert_eq!(stable_id("greenhouse").get_version_num(), 5);
    }

    #[test]
    fn test_characteristic_names() {
        assert_eq!(Characteristic::Pm2_5Density.to_string(), "PM2_5Density");
        assert_eq!(
            serde_json::to_string(&Characteristic::Pm10Density).unwrap(),
            "\"PM10Density\""
        );
        assert_eq!(
            Characteristic::CurrentAmbientLightLevel.to_string(),
            "CurrentAmbientLightLevel"
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(CharacteristicValue::from(21.5).as_f64(), Some(21.5));
        assert_eq!(CharacteristicValue::from(3u8).as_f64(), Some(3.0));
        assert_eq!(CharacteristicValue::from(true), CharacteristicValue::Bool(true));
        assert_eq!(CharacteristicValue::from("Pimoroni").as_str(), Some("Pimoroni"));
        assert_eq!(CharacteristicValue::from(true).as_f64(), None);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            CharacteristicValue::from(1013.2),
            CharacteristicValue::from(false),
            CharacteristicValue::from("grow"),
        ])
        .unwrap();
        assert_eq!(json, r#"[1013.2,false,"grow"]"#);
    }
}
