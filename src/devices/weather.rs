//! Enviro Weather: outdoor light, wind and rain.

use super::climate::{ClimateServices, set_number};
use super::{DeviceHandler, DeviceKind, Reading, clamp_light_level};
use crate::accessory::{Accessory, Characteristic, Service, ServiceType};
use log::debug;
use std::sync::Arc;

/// Wind and rain have no matching service; they are only logged.
pub struct WeatherHandler {
    name: String,
    accessory: Arc<Accessory>,
    climate: ClimateServices,
    light: Arc<Service>,
}

impl WeatherHandler {
    pub fn new(name: impl Into<String>, accessory: Arc<Accessory>) -> Self {
        let climate = ClimateServices::attach(&accessory);
        let light = accessory.get_or_add_service(ServiceType::LightSensor, "Light", None);
        Self {
            name: name.into(),
            accessory,
            climate,
            light,
        }
    }
}

impl DeviceHandler for WeatherHandler {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Weather
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    fn project(&self, reading: &Reading) {
        self.climate.project(&self.name, reading);
        debug!("{} new light: {:?}", self.name, reading.light);
        debug!("{} new rain: {:?}", self.name, reading.rain);
        debug!("{} new wind speed: {:?}", self.name, reading.wind_speed);
        debug!(
            "{} new wind direction: {:?}",
            self.name, reading.wind_direction
        );

        set_number(
            &self.light,
            Characteristic::CurrentAmbientLightLevel,
            reading.light.map(clamp_light_level),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::stable_id;
    use crate::devices::MIN_LIGHT_LEVEL;

    fn light_after(json: &str) -> Option<f64> {
        let accessory = Arc::new(Accessory::new("Garden", stable_id("garden")));
        let handler = WeatherHandler::new("Garden", accessory.clone());
        handler.project(&serde_json::from_str::<Reading>(json).unwrap());
        accessory
            .get_service(ServiceType::LightSensor, None)
            .and_then(|s| s.get_characteristic(Characteristic::CurrentAmbientLightLevel))
            .and_then(|v| v.as_f64())
    }

    #[test]
    fn test_light_floor() {
        assert_eq!(light_after(r#"{"light":0}"#), Some(MIN_LIGHT_LEVEL));
        assert_eq!(light_after(r#"{"light":1520.75}"#), Some(1520.75));
        assert_eq!(light_after(r#"{"wind_speed":4.2,"rain":0.3}"#), None);
    }

    #[test]
    fn test_projects_climate() {
        let accessory = Arc::new(Accessory::new("Garden", stable_id("garden")));
        let handler = WeatherHandler::new("Garden", accessory.clone());
        handler.project(
            &serde_json::from_str::<Reading>(
                r#"{"model":"weather","temperature":9.5,"humidity":88,"wind_direction":270}"#,
            )
            .unwrap(),
        );

        let temp = accessory
            .get_service(ServiceType::TemperatureSensor, None)
            .and_then(|s| s.get_characteristic(Characteristic::CurrentTemperature))
            .and_then(|v| v.as_f64());
        assert_eq!(temp, Some(9.5));
    }
}
