//! Enviro Indoor: ambient light and colour temperature.

use super::climate::{ClimateServices, set_number};
use super::{DeviceHandler, DeviceKind, Reading, clamp_light_level};
use crate::accessory::{Accessory, Characteristic, Service, ServiceType};
use log::debug;
use std::sync::Arc;

pub struct IndoorHandler {
    name: String,
    accessory: Arc<Accessory>,
    climate: ClimateServices,
    light: Arc<Service>,
    // lightbulb is the only service type carrying a colour temperature
    color_temp: Arc<Service>,
}

impl IndoorHandler {
    pub fn new(name: impl Into<String>, accessory: Arc<Accessory>) -> Self {
        let climate = ClimateServices::attach(&accessory);
        let light = accessory.get_or_add_service(ServiceType::LightSensor, "Light", None);
        let color_temp =
            accessory.get_or_add_service(ServiceType::Lightbulb, "Colour temperature", None);
        Self {
            name: name.into(),
            accessory,
            climate,
            light,
            color_temp,
        }
    }
}

impl DeviceHandler for IndoorHandler {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Indoor
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    fn project(&self, reading: &Reading) {
        self.climate.project(&self.name, reading);
        debug!("{} new color temp: {:?}", self.name, reading.color_temperature);
        debug!("{} new luminance: {:?}", self.name, reading.luminance);

        set_number(
            &self.color_temp,
            Characteristic::ColorTemperature,
            reading.color_temperature,
        );
        set_number(
            &self.light,
            Characteristic::CurrentAmbientLightLevel,
            reading.luminance.map(clamp_light_level),
        );
    }
}
