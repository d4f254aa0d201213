//! Fallback handler for boards of unknown kind.

use super::climate::ClimateServices;
use super::{DeviceHandler, DeviceKind, Reading};
use crate::accessory::Accessory;
use std::sync::Arc;

/// Exposes only temperature, humidity and pressure.
pub struct CommonHandler {
    name: String,
    accessory: Arc<Accessory>,
    climate: ClimateServices,
}

impl CommonHandler {
    pub fn new(name: impl Into<String>, accessory: Arc<Accessory>) -> Self {
        let climate = ClimateServices::attach(&accessory);
        Self {
            name: name.into(),
            accessory,
            climate,
        }
    }
}

impl DeviceHandler for CommonHandler {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Common
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    fn project(&self, reading: &Reading) {
        self.climate.project(&self.name, reading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::{Characteristic, ServiceType, stable_id};

    #[test]
    fn test_projects_climate() {
        let accessory = Arc::new(Accessory::new("deviceA", stable_id("deviceA")));
        let handler = CommonHandler::new("deviceA", accessory.clone());
        let reading: Reading =
            serde_json::from_str(r#"{"temperature":21.5,"humidity":40,"pressure":1013}"#).unwrap();

        handler.project(&reading);

        let value = |t, sub, c| {
            accessory
                .get_service(t, sub)
                .and_then(|s| s.get_characteristic(c))
                .and_then(|v| v.as_f64())
        };
        assert_eq!(
            value(ServiceType::TemperatureSensor, None, Characteristic::CurrentTemperature),
            Some(21.5)
        );
        assert_eq!(
            value(
                ServiceType::HumiditySensor,
                Some("general-humidity"),
                Characteristic::CurrentRelativeHumidity
            ),
            Some(40.0)
        );
        assert_eq!(
            value(ServiceType::AirPressureSensor, None, Characteristic::AirPressure),
            Some(1013.0)
        );
    }

    #[test]
    fn test_missing_fields_leave_values_unset() {
        let accessory = Arc::new(Accessory::new("deviceB", stable_id("deviceB")));
        let handler = CommonHandler::new("deviceB", accessory.clone());

        handler.project(&serde_json::from_str::<Reading>(r#"{"temperature":18.0}"#).unwrap());
        handler.project(&serde_json::from_str::<Reading>(r#"{"humidity":55}"#).unwrap());

        let temperature = accessory
            .get_service(ServiceType::TemperatureSensor, None)
            .unwrap();
        assert_eq!(
            temperature
                .get_characteristic(Characteristic::CurrentTemperature)
                .and_then(|v| v.as_f64()),
            Some(18.0)
        );
        let pressure = accessory
            .get_service(ServiceType::AirPressureSensor, None)
            .unwrap();
        assert_eq!(pressure.get_characteristic(Characteristic::AirPressure), None);
    }
}
