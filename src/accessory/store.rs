//! Cached accessory store.
//!
//! Keeps every known accessory in memory and, when given a path, persists
//! them as JSON so that the same accessories (and their last values) come
//! back after a restart instead of being registered again.

use super::{Accessory, AccessoryHost, AccessoryRecord};
use crate::error::{BridgeError, Result};
use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// On-disk accessory cache.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CachedAccessories {
    pub accessories: Vec<AccessoryRecord>,
}

impl CachedAccessories {
    /// Read the cache file. A missing file is an empty cache.
    pub fn read(path: &Path) -> Result<Self> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| BridgeError::CacheFormat(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// In-memory [`AccessoryHost`] with optional JSON persistence.
///
/// Registration only marks the cache as pending; the file is written by
/// [`AccessoryStore::save`] or [`AccessoryStore::save_if_dirty`], off the
/// message path.
pub struct AccessoryStore {
    path: Option<PathBuf>,
    accessories: RwLock<Vec<Arc<Accessory>>>,
    pending_persist: AtomicBool,
}

impl AccessoryStore {
    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            accessories: RwLock::new(Vec::new()),
            pending_persist: AtomicBool::new(false),
        }
    }

    /// Open the cache at `path`, restoring every cached accessory whose display
    /// name is not listed in `ignored`.
    ///
    /// An unreadable cache is logged and treated as empty; it is overwritten on
    /// the next registration.
    pub fn open(path: PathBuf, ignored: &[String]) -> Self {
        let cached = match CachedAccessories::read(&path) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Failed to load accessory cache: {}", e);
                CachedAccessories::default()
            }
        };

        if cached.accessories.is_empty() {
            info!("No cached accessories found at {:?}", path);
        }

        let store = Self {
            path: Some(path),
            accessories: RwLock::new(Vec::new()),
            pending_persist: AtomicBool::new(false),
        };
        for record in cached.accessories {
            if ignored.iter().any(|name| *name == record.display_name) {
                info!("Skipping ignored cached accessory: {}", record.display_name);
                continue;
            }
            store.configure_accessory(Accessory::from_record(record));
        }
        store
    }

    /// Add a restored accessory so the platform can find it again.
    fn configure_accessory(&self, accessory: Accessory) {
        info!("Loading accessory from cache: {}", accessory.display_name());
        self.accessories.write().push(Arc::new(accessory));
    }

    pub fn len(&self) -> usize {
        self.accessories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.read().is_empty()
    }

    /// Persist all accessories, including their current characteristic values.
    pub fn save(&self) -> Result<()> {
        self.pending_persist.store(false, Ordering::SeqCst);
        let Some(path) = &self.path else {
            return Ok(());
        };
        let cached = CachedAccessories {
            accessories: self
                .accessories
                .read()
                .iter()
                .map(|a| a.to_record())
                .collect(),
        };
        if let Err(e) = cached.write(path) {
            self.pending_persist.store(true, Ordering::SeqCst);
            return Err(e);
        }
        info!("Saved {} accessories to {:?}", cached.accessories.len(), path);
        Ok(())
    }

    /// Save only if accessories were registered since the last save.
    /// Returns whether a save happened.
    pub fn save_if_dirty(&self) -> Result<bool> {
        if !self.pending_persist.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}

impl AccessoryHost for AccessoryStore {
    fn find_accessory(&self, uuid: &Uuid) -> Option<Arc<Accessory>> {
        self.accessories
            .read()
            .iter()
            .find(|a| a.uuid() == *uuid)
            .cloned()
    }

    fn register_accessories(&self, accessories: &[Arc<Accessory>]) {
        let mut known = self.accessories.write();
        for accessory in accessories {
            if known.iter().any(|a| a.uuid() == accessory.uuid()) {
                continue;
            }
            info!(
                "Registered accessory {} ({})",
                accessory.display_name(),
                accessory.uuid()
            );
            known.push(accessory.clone());
            self.pending_persist.store(true, Ordering::SeqCst);
        }
    }
}
