//! Enviro Urban: particulate matter and noise.

use super::climate::{ClimateServices, set_number};
use super::{DeviceHandler, DeviceKind, Reading};
use crate::accessory::{Accessory, Characteristic, Service, ServiceType};
use log::debug;
use std::sync::Arc;

/// Air quality category from a PM2.5 density in µg/m³.
///
/// 1 = excellent .. 5 = poor, using the US EPA breakpoints.
pub fn air_quality_from_pm2_5(pm2_5: f64) -> u8 {
    match pm2_5 {
        x if x <= 12.0 => 1,
        x if x <= 35.4 => 2,
        x if x <= 55.4 => 3,
        x if x <= 150.4 => 4,
        _ => 5,
    }
}

pub struct UrbanHandler {
    name: String,
    accessory: Arc<Accessory>,
    climate: ClimateServices,
    air_quality: Arc<Service>,
}

impl UrbanHandler {
    pub fn new(name: impl Into<String>, accessory: Arc<Accessory>) -> Self {
        let climate = ClimateServices::attach(&accessory);
        let air_quality =
            accessory.get_or_add_service(ServiceType::AirQualitySensor, "Air quality", None);
        Self {
            name: name.into(),
            accessory,
            climate,
            air_quality,
        }
    }
}

impl DeviceHandler for UrbanHandler {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Urban
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    fn project(&self, reading: &Reading) {
        self.climate.project(&self.name, reading);
        debug!("{} new pm1: {:?}", self.name, reading.pm1);
        debug!("{} new pm2.5: {:?}", self.name, reading.pm2_5);
        debug!("{} new pm10: {:?}", self.name, reading.pm10);
        debug!("{} new noise: {:?}", self.name, reading.noise);

        set_number(&self.air_quality, Characteristic::Pm2_5Density, reading.pm2_5);
        set_number(&self.air_quality, Characteristic::Pm10Density, reading.pm10);
        if let Some(pm2_5) = reading.pm2_5 {
            self.air_quality
                .set_characteristic(Characteristic::AirQuality, air_quality_from_pm2_5(pm2_5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::stable_id;

    #[test]
    fn test_air_quality_breakpoints() {
        assert_eq!(air_quality_from_pm2_5(0.0), 1);
        assert_eq!(air_quality_from_pm2_5(12.0), 1);
        assert_eq!(air_quality_from_pm2_5(20.0), 2);
        assert_eq!(air_quality_from_pm2_5(40.0), 3);
        assert_eq!(air_quality_from_pm2_5(100.0), 4);
        assert_eq!(air_quality_from_pm2_5(250.0), 5);
    }

    #[test]
    fn test_projects_particulates() {
        let accessory = Arc::new(Accessory::new("Street", stable_id("street")));
        let handler = UrbanHandler::new("Street", accessory.clone());
        let reading: Reading = serde_json::from_str(
            r#"{"model":"urban","temperature":15.2,"humidity":70,"pressure":1002,
                "noise":0.42,"pm1":3,"pm2_5":18,"pm10":27}"#,
        )
        .unwrap();

        handler.project(&reading);

        let air = accessory
            .get_service(ServiceType::AirQualitySensor, None)
            .unwrap();
        let value = |c| air.get_characteristic(c).and_then(|v| v.as_f64());
        assert_eq!(value(Characteristic::Pm2_5Density), Some(18.0));
        assert_eq!(value(Characteristic::Pm10Density), Some(27.0));
        assert_eq!(value(Characteristic::AirQuality), Some(2.0));
    }

    #[test]
    fn test_missing_pm2_5_leaves_air_quality_unset() {
        let accessory = Arc::new(Accessory::new("Street", stable_id("street")));
        let handler = UrbanHandler::new("Street", accessory.clone());

        handler.project(&serde_json::from_str::<Reading>(r#"{"pm10":9}"#).unwrap());

        let air = accessory
            .get_service(ServiceType::AirQualitySensor, None)
            .unwrap();
        assert_eq!(air.get_characteristic(Characteristic::AirQuality), None);
        assert_eq!(air.get_characteristic(Characteristic::Pm2_5Density), None);
    }
}
