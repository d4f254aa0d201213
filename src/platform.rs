//! Enviro platform: one handler per physical board.
//!
//! The first reading from a board decides its kind, finds (or creates and
//! registers) its accessory and builds the handler. Every later reading for
//! the same board goes straight to that handler, including readings that
//! start carrying a hardware address after the board was first seen by its
//! topic name.

use crate::accessory::{AccessoryHost, stable_id};
use crate::devices::{DeviceHandler, DeviceKind, Reading, build_handler};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a board.
///
/// `id` deduplicates handlers: the hardware address when the reading carries
/// one, otherwise the topic-derived name. `name` is what the accessory is
/// called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceKey {
    id: String,
    name: String,
}

impl DeviceKey {
    /// Resolve the identity of a reading published under `topic_name`.
    ///
    /// Returns `None` when neither a hardware address nor a topic name exists.
    pub fn resolve(topic_name: Option<&str>, reading: &Reading) -> Option<Self> {
        let topic_name = topic_name.map(str::trim).filter(|n| !n.is_empty());
        let id = reading.mac().or(topic_name)?;
        let name = topic_name
            .or(reading.device.as_deref().filter(|d| !d.is_empty()))
            .unwrap_or(id);
        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable accessory id for this device.
    pub fn stable_id(&self) -> Uuid {
        stable_id(&self.id)
    }
}

impl std::fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.id == self.name {
            f.write_str(&self.name)
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}

/// Dispatches readings to per-device handlers.
pub struct Platform<H: AccessoryHost> {
    host: Arc<H>,
    handlers: HashMap<String, Box<dyn DeviceHandler>>,
    /// Other identifiers of a known board (topic name or late hardware
    /// address) mapped to its handler id.
    aliases: HashMap<String, String>,
}

impl<H: AccessoryHost> Platform<H> {
    pub fn new(name: impl Into<String>, host: Arc<H>) -> Self {
        let name: String = name.into();
        info!("[Platform] Finished initializing platform: {}", name);
        Self {
            host,
            handlers: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Find the handler id for `key`, linking a late hardware address to a
    /// board first seen under its topic name.
    fn resolve_handler(&mut self, key: &DeviceKey) -> Option<String> {
        if self.handlers.contains_key(key.id()) {
            return Some(key.id().to_string());
        }
        if let Some(id) = self.aliases.get(key.id()) {
            return Some(id.clone());
        }
        // A name-keyed handler already linked to another address belongs to a
        // different board.
        let claimed = self.aliases.values().any(|id| id == key.name());
        if key.id() != key.name() && !claimed && self.handlers.contains_key(key.name()) {
            info!(
                "[Platform] Linking hardware address {} to {}",
                key.id(),
                key.name()
            );
            self.aliases
                .insert(key.id().to_string(), key.name().to_string());
            return Some(key.name().to_string());
        }
        None
    }

    /// Route one reading to its device's handler, creating it on first sight.
    pub fn on_reading(&mut self, key: &DeviceKey, reading: &Reading) {
        if let Some(id) = self.resolve_handler(key)
            && let Some(handler) = self.handlers.get(&id)
        {
            handler.project(reading);
            return;
        }

        let kind = DeviceKind::classify(reading);
        let (accessory, created) = self
            .host
            .find_or_create_accessory(key.name(), key.stable_id());
        if created {
            info!("[Platform] Adding new accessory: {} as {}", key, kind);
        } else {
            info!(
                "[Platform] Restoring existing accessory from cache: {} as {}",
                accessory.display_name(),
                kind
            );
        }

        let handler = build_handler(kind, key.name(), accessory.clone(), reading);
        handler.project(reading);
        self.handlers.insert(key.id().to_string(), handler);
        if key.id() != key.name() && !self.handlers.contains_key(key.name()) {
            self.aliases
                .entry(key.name().to_string())
                .or_insert_with(|| key.id().to_string());
        }

        if created {
            self.host.register_accessories(&[accessory]);
        }
    }

    pub fn handler(&self, id: &str) -> Option<&dyn DeviceHandler> {
        self.handlers.get(id).map(|h| h.as_ref())
    }

    /// `(id, kind, name)` of every known device.
    pub fn devices(&self) -> Vec<(String, DeviceKind, String)> {
        let mut devices: Vec<_> = self
            .handlers
            .iter()
            .map(|(id, h)| (id.clone(), h.kind(), h.name().to_string()))
            .collect();
        devices.sort();
        devices
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::{Accessory, AccessoryStore, Characteristic, ServiceType};

    fn reading(json: &str) -> Reading {
        serde_json::from_str(json).unwrap()
    }

    fn platform() -> Platform<AccessoryStore> {
        Platform::new("Enviro", Arc::new(AccessoryStore::in_memory()))
    }

    #[test]
    fn test_key_prefers_mac() {
        let r = reading(r#"{"mac":"28:cd:c1:00:aa:01","device":"enviro-grow"}"#);
        let key = DeviceKey::resolve(Some("greenhouse"), &r).unwrap();
        assert_eq!(key.id(), "28:cd:c1:00:aa:01");
        assert_eq!(key.name(), "greenhouse");
        assert_eq!(key.to_string(), "greenhouse (28:cd:c1:00:aa:01)");

        let key = DeviceKey::resolve(None, &r).unwrap();
        assert_eq!(key.name(), "enviro-grow");

        let r = reading(r#"{"mac":"  "}"#);
        let key = DeviceKey::resolve(Some("greenhouse"), &r).unwrap();
        assert_eq!(key.id(), "greenhouse");
        assert_eq!(key.to_string(), "greenhouse");

        assert!(DeviceKey::resolve(Some(""), &Reading::default()).is_none());
    }

    #[test]
    fn test_one_handler_per_key() {
        let mut platform = platform();
        let key = DeviceKey::resolve(Some("deviceA"), &Reading::default()).unwrap();
        for t in 0..5 {
            platform.on_reading(&key, &reading(&format!(r#"{{"temperature":{}}}"#, 20 + t)));
        }
        assert_eq!(platform.len(), 1);
        assert_eq!(platform.host().len(), 1);

        let handler = platform.handler("deviceA").unwrap();
        let temp = handler
            .accessory()
            .get_service(ServiceType::TemperatureSensor, None)
            .and_then(|s| s.get_characteristic(Characteristic::CurrentTemperature))
            .and_then(|v| v.as_f64());
        assert_eq!(temp, Some(24.0));
    }

    #[test]
    fn test_late_mac_reuses_topic_handler() {
        let mut platform = platform();
        let first = reading(r#"{"model":"grow","temperature":20.0}"#);
        let key = DeviceKey::resolve(Some("greenhouse"), &first).unwrap();
        platform.on_reading(&key, &first);

        let second = reading(r#"{"model":"grow","temperature":21.0,"mac":"28:cd:c1:00:aa:01"}"#);
        let key = DeviceKey::resolve(Some("greenhouse"), &second).unwrap();
        platform.on_reading(&key, &second);

        // later readings keyed only by the address still land on the same board
        let third = reading(r#"{"temperature":22.0,"mac":"28:cd:c1:00:aa:01"}"#);
        let key = DeviceKey::resolve(Some("greenhouse-2"), &third).unwrap();
        platform.on_reading(&key, &third);

        assert_eq!(platform.len(), 1);
        assert_eq!(platform.host().len(), 1);
        let temp = platform
            .handler("greenhouse")
            .unwrap()
            .accessory()
            .get_service(ServiceType::TemperatureSensor, None)
            .and_then(|s| s.get_characteristic(Characteristic::CurrentTemperature))
            .and_then(|v| v.as_f64());
        assert_eq!(temp, Some(22.0));
    }

    #[test]
    fn test_mac_board_keeps_topic_alias() {
        let mut platform = platform();
        let first = reading(r#"{"mac":"e6:61:64:08:0b:2c","model":"weather","light":5}"#);
        let key = DeviceKey::resolve(Some("garden"), &first).unwrap();
        platform.on_reading(&key, &first);

        let second = reading(r#"{"light":9}"#);
        let key = DeviceKey::resolve(Some("garden"), &second).unwrap();
        platform.on_reading(&key, &second);

        assert_eq!(platform.len(), 1);
        assert_eq!(
            platform.handler("e6:61:64:08:0b:2c").unwrap().kind(),
            DeviceKind::Weather
        );
    }

    #[test]
    fn test_second_address_on_claimed_topic_is_a_new_board() {
        let mut platform = platform();
        let key = DeviceKey::resolve(Some("shed"), &Reading::default()).unwrap();
        platform.on_reading(&key, &reading(r#"{"temperature":10.0}"#));

        for mac in ["28:cd:c1:00:aa:01", "28:cd:c1:00:aa:02"] {
            let r = reading(&format!(r#"{{"mac":"{}","temperature":11.0}}"#, mac));
            let key = DeviceKey::resolve(Some("shed"), &r).unwrap();
            platform.on_reading(&key, &r);
        }

        assert_eq!(
            platform
                .devices()
                .into_iter()
                .map(|(id, _, _)| id)
                .collect::<Vec<_>>(),
            vec!["28:cd:c1:00:aa:02".to_string(), "shed".to_string()]
        );
    }

    #[test]
    fn test_kind_is_fixed_by_first_reading() {
        let mut platform = platform();
        let key = DeviceKey::resolve(Some("shed"), &Reading::default()).unwrap();

        platform.on_reading(&key, &reading(r#"{"temperature":11.0}"#));
        platform.on_reading(&key, &reading(r#"{"model":"grow","moisture_1":20}"#));

        assert_eq!(platform.handler("shed").unwrap().kind(), DeviceKind::Common);
    }

    #[test]
    fn test_same_mac_different_topics() {
        let mut platform = platform();
        let first = reading(r#"{"mac":"e6:61:64:08:0b:2c","model":"urban","pm2_5":4}"#);
        let second = reading(r#"{"mac":"e6:61:64:08:0b:2c","model":"urban","pm2_5":9}"#);

        let key = DeviceKey::resolve(Some("street"), &first).unwrap();
        platform.on_reading(&key, &first);
        let key = DeviceKey::resolve(Some("street-renamed"), &second).unwrap();
        platform.on_reading(&key, &second);

        assert_eq!(platform.len(), 1);
        let handler = platform.handler("e6:61:64:08:0b:2c").unwrap();
        assert_eq!(handler.kind(), DeviceKind::Urban);
        assert_eq!(handler.name(), "street");
        let pm = handler
            .accessory()
            .get_service(ServiceType::AirQualitySensor, None)
            .and_then(|s| s.get_characteristic(Characteristic::Pm2_5Density))
            .and_then(|v| v.as_f64());
        assert_eq!(pm, Some(9.0));
    }

    #[test]
    fn test_restored_accessory_is_reused() {
        let store = Arc::new(AccessoryStore::in_memory());
        let cached = Arc::new(Accessory::new("greenhouse", stable_id("greenhouse")));
        store.register_accessories(&[cached.clone()]);

        let mut platform = Platform::new("Enviro", store.clone());
        let key = DeviceKey::resolve(Some("greenhouse"), &Reading::default()).unwrap();
        platform.on_reading(&key, &reading(r#"{"model":"grow","moisture_2":41}"#));

        assert_eq!(store.len(), 1);
        let handler = platform.handler("greenhouse").unwrap();
        assert!(Arc::ptr_eq(handler.accessory(), &cached));
        assert_eq!(handler.kind(), DeviceKind::Grow);
    }

    #[test]
    fn test_devices_listing() {
        let mut platform = platform();
        for (topic, json) in [
            ("weather", r#"{"wind_speed":1.0}"#),
            ("grow", r#"{"moisture_1":1.0,"noise":0.1}"#),
            ("indoor", r#"{"luminance":10}"#),
        ] {
            let key = DeviceKey::resolve(Some(topic), &Reading::default()).unwrap();
            platform.on_reading(&key, &reading(json));
        }

        assert_eq!(
            platform.devices(),
            vec![
                ("grow".to_string(), DeviceKind::Grow, "grow".to_string()),
                ("indoor".to_string(), DeviceKind::Indoor, "indoor".to_string()),
                ("weather".to_string(), DeviceKind::Weather, "weather".to_string()),
            ]
        );
    }
}
