//! Enviro Grow: three soil moisture probes, a light sensor and pump outputs.

use super::climate::{ClimateServices, set_number};
use super::{DeviceHandler, DeviceKind, Reading, clamp_light_level};
use crate::accessory::{Accessory, Characteristic, Service, ServiceType};
use log::debug;
use std::sync::Arc;

const PROBES: usize = 3;

pub struct GrowHandler {
    name: String,
    accessory: Arc<Accessory>,
    climate: ClimateServices,
    /// Soil moisture probes, reported as relative humidity.
    moisture: [Arc<Service>; PROBES],
    pumps: [Arc<Service>; PROBES],
    light: Arc<Service>,
}

impl GrowHandler {
    pub fn new(name: impl Into<String>, accessory: Arc<Accessory>) -> Self {
        let climate = ClimateServices::attach(&accessory);
        let moisture = std::array::from_fn(|i| {
            accessory.get_or_add_service(
                ServiceType::HumiditySensor,
                &format!("Soil moisture {}", i + 1),
                Some(&format!("soil-moisture-{}", i + 1)),
            )
        });
        let pumps = std::array::from_fn(|i| {
            accessory.get_or_add_service(
                ServiceType::Switch,
                &format!("Pump {}", i + 1),
                Some(&format!("pump-{}", i + 1)),
            )
        });
        let light = accessory.get_or_add_service(ServiceType::LightSensor, "Light", None);
        Self {
            name: name.into(),
            accessory,
            climate,
            moisture,
            pumps,
            light,
        }
    }
}

impl DeviceHandler for GrowHandler {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Grow
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    fn project(&self, reading: &Reading) {
        self.climate.project(&self.name, reading);

        let moisture = [reading.moisture_1, reading.moisture_2, reading.moisture_3];
        let pumps = [reading.pump_1_on, reading.pump_2_on, reading.pump_3_on];
        debug!(
            "{} new soil moistures: {:?}, pumps: {:?}",
            self.name, moisture, pumps
        );
        debug!("{} new light: {:?}", self.name, reading.light);

        for (service, value) in self.moisture.iter().zip(moisture) {
            set_number(service, Characteristic::CurrentRelativeHumidity, value);
        }
        for (service, on) in self.pumps.iter().zip(pumps) {
            if let Some(on) = on {
                service.set_characteristic(Characteristic::On, on);
            }
        }
        set_number(
            &self.light,
            Characteristic::CurrentAmbientLightLevel,
            reading.light.map(clamp_light_level),
        );
    }
}
