//! Enviro boards and their projections onto accessory services.
//!
//! Every board publishes one JSON [`Reading`] per sample. The board kind is
//! taken from the `model` tag when present; older firmware omits it, in which
//! case the kind is guessed from which fields the reading carries.

mod climate;
pub mod common;
pub mod grow;
pub mod indoor;
pub mod urban;
pub mod weather;

pub use common::CommonHandler;
pub use grow::GrowHandler;
pub use indoor::IndoorHandler;
pub use urban::UrbanHandler;
pub use weather::WeatherHandler;

use crate::accessory::{Accessory, Characteristic};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString, IntoStaticStr};

/// Lowest light level written to the host, which rejects non-positive lux.
pub const MIN_LIGHT_LEVEL: f64 = 0.0001;

/// Manufacturer reported on every accessory.
pub const MANUFACTURER: &str = "Pimoroni";

/// One sensor sample as published by an Enviro board.
///
/// All fields are optional: a field the board did not send, or sent with the
/// wrong type, simply leaves the matching characteristic untouched. Unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
    #[serde(deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub mac: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub uid: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub device: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub timestamp: Option<String>,

    #[serde(deserialize_with = "lenient")]
    pub temperature: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub humidity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub pressure: Option<f64>,

    // grow
    #[serde(deserialize_with = "lenient")]
    pub moisture_1: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub moisture_2: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub moisture_3: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub pump_1_on: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub pump_2_on: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub pump_3_on: Option<bool>,

    // grow and weather
    #[serde(deserialize_with = "lenient")]
    pub light: Option<f64>,

    // indoor
    #[serde(deserialize_with = "lenient")]
    pub luminance: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub color_temperature: Option<f64>,

    // weather
    #[serde(deserialize_with = "lenient")]
    pub wind_speed: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub wind_direction: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub rain: Option<f64>,

    // urban
    #[serde(deserialize_with = "lenient")]
    pub noise: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub pm1: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub pm2_5: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub pm10: Option<f64>,
}

/// Read an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

impl Reading {
    /// Hardware address, if the board reported a non-empty one.
    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    /// Model tag, if the board reported a non-empty one.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }

    pub fn has_soil_moisture(&self) -> bool {
        self.moisture_1.is_some() || self.moisture_2.is_some() || self.moisture_3.is_some()
    }

    pub fn has_noise(&self) -> bool {
        self.noise.is_some()
    }

    pub fn has_luminance(&self) -> bool {
        self.luminance.is_some()
    }

    pub fn has_wind_speed(&self) -> bool {
        self.wind_speed.is_some()
    }

    /// Serial number for the accessory information service.
    pub fn serial_number(&self) -> &str {
        self.uid
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.mac())
            .unwrap_or("unknown")
    }
}

/// Enviro board kinds.
///
/// Parsed from the lowercase `model` tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Common,
    Grow,
    Indoor,
    Urban,
    Weather,
}

type LegacyRule = (fn(&Reading) -> bool, DeviceKind);

/// Field sniffing for readings without a model tag, in priority order.
/// A reading matching several rules takes the first.
const LEGACY_RULES: [LegacyRule; 4] = [
    (Reading::has_soil_moisture, DeviceKind::Grow),
    (Reading::has_noise, DeviceKind::Urban),
    (Reading::has_luminance, DeviceKind::Indoor),
    (Reading::has_wind_speed, DeviceKind::Weather),
];

impl DeviceKind {
    /// Map a model tag to a kind. Unrecognized tags fall back to `Common`.
    pub fn from_model(tag: &str) -> Self {
        tag.parse().unwrap_or_else(|_| {
            debug!("Unknown Enviro model {:?}, using common handler", tag);
            DeviceKind::Common
        })
    }

    /// Classify a reading by its model tag, or by its fields when untagged.
    pub fn classify(reading: &Reading) -> Self {
        match reading.model() {
            Some(tag) => Self::from_model(tag),
            None => LEGACY_RULES
                .iter()
                .find(|(matches, _)| matches(reading))
                .map(|(_, kind)| *kind)
                .unwrap_or(DeviceKind::Common),
        }
    }

    /// Model string shown in the accessory information service.
    pub fn model_name(&self) -> &'static str {
        match self {
            DeviceKind::Common => "unknown",
            other => (*other).into(),
        }
    }
}

/// Per-device projection of readings onto accessory services.
pub trait DeviceHandler: Send {
    fn kind(&self) -> DeviceKind;

    /// Display name of the device.
    fn name(&self) -> &str;

    fn accessory(&self) -> &Arc<Accessory>;

    /// Write the reading's fields onto this device's services.
    fn project(&self, reading: &Reading);
}

/// Build the handler for `kind`, attaching its services to `accessory`.
///
/// The first reading supplies the serial number.
pub fn build_handler(
    kind: DeviceKind,
    name: &str,
    accessory: Arc<Accessory>,
    first: &Reading,
) -> Box<dyn DeviceHandler> {
    accessory
        .information()
        .set_characteristic(Characteristic::Manufacturer, MANUFACTURER)
        .set_characteristic(Characteristic::Model, kind.model_name())
        .set_characteristic(Characteristic::SerialNumber, first.serial_number());

    match kind {
        DeviceKind::Common => Box::new(CommonHandler::new(name, accessory)),
        DeviceKind::Grow => Box::new(GrowHandler::new(name, accessory)),
        DeviceKind::Indoor => Box::new(IndoorHandler::new(name, accessory)),
        DeviceKind::Urban => Box::new(UrbanHandler::new(name, accessory)),
        DeviceKind::Weather => Box::new(WeatherHandler::new(name, accessory)),
    }
}

/// Light level as accepted by the host: non-positive values become
/// [`MIN_LIGHT_LEVEL`].
pub fn clamp_light_level(lux: f64) -> f64 {
    if lux > 0.0 { lux } else { MIN_LIGHT_LEVEL }
}
