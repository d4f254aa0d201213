//! A single accessory and the services it exposes.

use super::service::{Service, ServiceRecord};
use super::{Characteristic, ServiceType};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// An accessory as the host sees it: a stable id, a display name and an
/// ordered list of services.
///
/// Every accessory carries an `AccessoryInformation` service from creation.
pub struct Accessory {
    uuid: Uuid,
    display_name: String,
    created_at: DateTime<Utc>,
    services: RwLock<Vec<Arc<Service>>>,
}

impl Accessory {
    pub fn new(display_name: impl Into<String>, uuid: Uuid) -> Self {
        let display_name = display_name.into();
        let information = Service::new(ServiceType::AccessoryInformation, &display_name, None);
        information.set_characteristic(Characteristic::Name, display_name.as_str());
        Self {
            uuid,
            display_name,
            created_at: Utc::now(),
            services: RwLock::new(vec![Arc::new(information)]),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The accessory information service (manufacturer, model, serial).
    pub fn information(&self) -> Arc<Service> {
        self.get_or_add_service(ServiceType::AccessoryInformation, &self.display_name, None)
    }

    pub fn get_service(&self, service_type: ServiceType, subtype: Option<&str>) -> Option<Arc<Service>> {
        self.services
            .read()
            .iter()
            .find(|s| s.matches(service_type, subtype))
            .cloned()
    }

    /// Return the matching service, adding it if the accessory lacks one.
    ///
    /// Restored accessories already carry their services, so handlers attach
    /// to the cached instances instead of duplicating them.
    pub fn get_or_add_service(
        &self,
        service_type: ServiceType,
        name: &str,
        subtype: Option<&str>,
    ) -> Arc<Service> {
        let mut services = self.services.write();
        if let Some(existing) = services.iter().find(|s| s.matches(service_type, subtype)) {
            return existing.clone();
        }
        let service = Arc::new(Service::new(service_type, name, subtype));
        services.push(service.clone());
        service
    }

    pub fn services(&self) -> Vec<Arc<Service>> {
        self.services.read().clone()
    }

    pub fn to_record(&self) -> AccessoryRecord {
        AccessoryRecord {
            uuid: self.uuid,
            display_name: self.display_name.clone(),
            created_at: self.created_at,
            services: self.services.read().iter().map(|s| s.to_record()).collect(),
        }
    }

    pub fn from_record(record: AccessoryRecord) -> Self {
        Self {
            uuid: record.uuid,
            display_name: record.display_name,
            created_at: record.created_at,
            services: RwLock::new(
                record
                    .services
                    .into_iter()
                    .map(|s| Arc::new(Service::from_record(s)))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Debug for Accessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessory")
            .field("uuid", &self.uuid)
            .field("display_name", &self.display_name)
            .field("services", &self.services.read().len())
            .finish()
    }
}

/// Persisted form of an [`Accessory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryRecord {
    pub uuid: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
}
