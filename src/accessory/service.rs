//! Accessory services and their characteristic values.
//!
//! A service is the unit the device handlers write into: one temperature
//! sensor, one soil moisture sensor, and so on. Values are shared state that
//! the accessory store reads when persisting, so they sit behind a lock.

use super::{Characteristic, CharacteristicValue, ServiceType};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One service on an accessory.
pub struct Service {
    service_type: ServiceType,
    name: String,
    subtype: Option<String>,
    values: RwLock<BTreeMap<Characteristic, CharacteristicValue>>,
}

impl Service {
    pub fn new(service_type: ServiceType, name: impl Into<String>, subtype: Option<&str>) -> Self {
        Self {
            service_type,
            name: name.into(),
            subtype: subtype.map(String::from),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Whether this service is the one identified by `service_type` and `subtype`.
    pub fn matches(&self, service_type: ServiceType, subtype: Option<&str>) -> bool {
        self.service_type == service_type && self.subtype.as_deref() == subtype
    }

    /// Set a characteristic value. Only changes are logged.
    pub fn set_characteristic(
        &self,
        characteristic: Characteristic,
        value: impl Into<CharacteristicValue>,
    ) -> &Self {
        let value = value.into();
        let mut values = self.values.write();
        if values.get(&characteristic) != Some(&value) {
            debug!("{} {} -> {}", self.name, characteristic, value);
            values.insert(characteristic, value);
        }
        self
    }

    pub fn get_characteristic(&self, characteristic: Characteristic) -> Option<CharacteristicValue> {
        self.values.read().get(&characteristic).cloned()
    }

    pub fn to_record(&self) -> ServiceRecord {
        ServiceRecord {
            service_type: self.service_type,
            name: self.name.clone(),
            subtype: self.subtype.clone(),
            characteristics: self
                .values
                .read()
                .iter()
                .map(|(characteristic, value)| CharacteristicRecord {
                    characteristic: *characteristic,
                    value: value.clone(),
                })
                .collect(),
        }
    }

    pub fn from_record(record: ServiceRecord) -> Self {
        let values = record
            .characteristics
            .into_iter()
            .map(|c| (c.characteristic, c.value))
            .collect();
        Self {
            service_type: record.service_type,
            name: record.name,
            subtype: record.subtype,
            values: RwLock::new(values),
        }
    }
}

/// Persisted form of a [`Service`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub service_type: ServiceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub characteristics: Vec<CharacteristicRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicRecord {
    pub characteristic: Characteristic,
    pub value: CharacteristicValue,
}
