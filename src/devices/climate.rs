//! Temperature, humidity and pressure services shared by every board.

use super::Reading;
use crate::accessory::{Accessory, Characteristic, Service, ServiceType};
use log::debug;
use std::sync::Arc;

pub(crate) struct ClimateServices {
    pub temperature: Arc<Service>,
    pub humidity: Arc<Service>,
    pub pressure: Arc<Service>,
}

impl ClimateServices {
    pub fn attach(accessory: &Accessory) -> Self {
        Self {
            temperature: accessory.get_or_add_service(
                ServiceType::TemperatureSensor,
                "Temperature",
                None,
            ),
            humidity: accessory.get_or_add_service(
                ServiceType::HumiditySensor,
                "General humidity",
                Some("general-humidity"),
            ),
            pressure: accessory.get_or_add_service(ServiceType::AirPressureSensor, "Pressure", None),
        }
    }

    pub fn project(&self, name: &str, reading: &Reading) {
        debug!("{} new humidity: {:?}", name, reading.humidity);
        debug!("{} new temp: {:?}", name, reading.temperature);
        debug!("{} new pressure: {:?}", name, reading.pressure);
        set_number(&self.temperature, Characteristic::CurrentTemperature, reading.temperature);
        set_number(&self.humidity, Characteristic::CurrentRelativeHumidity, reading.humidity);
        set_number(&self.pressure, Characteristic::AirPressure, reading.pressure);
    }
}

/// Write `value` if the reading carried it; absent fields leave the
/// characteristic as it was.
pub(crate) fn set_number(service: &Service, characteristic: Characteristic, value: Option<f64>) {
    if let Some(value) = value {
        service.set_characteristic(characteristic, value);
    }
}
