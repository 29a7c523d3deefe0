//! Device store - the authoritative collection of device descriptors
//!
//! Descriptors are kept in insertion order behind an async lock. When the
//! store is opened on a file, every mutation rewrites that file as a JSON
//! array so the registry survives restarts. A mutation whose write fails
//! leaves the in-memory list unchanged.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::descriptor::{DescriptorPayload, DeviceDescriptor, DeviceId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Device not found: {0}")]
    NotFound(String),
}

/// Concurrency-safe CRUD store for device descriptors
pub struct DeviceStore {
    devices: RwLock<Vec<DeviceDescriptor>>,
    /// Backing file, if persistent
    path: Option<PathBuf>,
}

impl DeviceStore {
    /// Create an empty store with no backing file
    pub fn in_memory() -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Open a store backed by `path`, loading existing descriptors if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let devices = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let devices: Vec<DeviceDescriptor> = if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            };
            info!(path = %path.display(), count = devices.len(), "Loaded device database");
            devices
        } else {
            info!(path = %path.display(), "Device database not found, starting empty");
            Vec::new()
        };

        Ok(Self {
            devices: RwLock::new(devices),
            path: Some(path),
        })
    }

    /// Insert or replace a descriptor by id.
    ///
    /// An unassigned id is replaced with a generated one. A replaced
    /// descriptor keeps its position in the listing order.
    pub async fn save(&self, mut descriptor: DeviceDescriptor) -> Result<DeviceDescriptor, StoreError> {
        if descriptor.id.is_unassigned() {
            descriptor.id = DeviceId::generate();
        }

        let mut devices = self.devices.write().await;
        let mut next = devices.clone();
        match next.iter_mut().find(|d| d.id == descriptor.id) {
            Some(existing) => *existing = descriptor.clone(),
            None => next.push(descriptor.clone()),
        }
        self.persist(&next).await?;
        *devices = next;

        debug!(device = %descriptor.id, "Saved device");
        Ok(descriptor)
    }

    /// Merge `update` into the descriptor stored under `id`.
    ///
    /// Lookup, merge and write happen under one lock, so a concurrent delete
    /// cannot be undone by an edit. Returns `None` when no such id exists.
    pub async fn update(
        &self,
        id: &str,
        update: DescriptorPayload,
    ) -> Result<Option<DeviceDescriptor>, StoreError> {
        let mut devices = self.devices.write().await;
        let Some(index) = devices.iter().position(|d| d.id.as_str() == id) else {
            return Ok(None);
        };

        let mut next = devices.clone();
        next[index].apply_update(update);
        let updated = next[index].clone();
        self.persist(&next).await?;
        *devices = next;

        debug!(device = %id, "Updated device");
        Ok(Some(updated))
    }

    /// Look up a descriptor by id
    pub async fn find_one(&self, id: &str) -> Option<DeviceDescriptor> {
        self.devices
            .read()
            .await
            .iter()
            .find(|d| d.id.as_str() == id)
            .cloned()
    }

    /// All descriptors in insertion order
    pub async fn find_all(&self) -> Vec<DeviceDescriptor> {
        self.devices.read().await.clone()
    }

    /// Remove a descriptor by id
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut devices = self.devices.write().await;
        let index = devices
            .iter()
            .position(|d| d.id.as_str() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut next = devices.clone();
        next.remove(index);
        self.persist(&next).await?;
        *devices = next;

        debug!(device = %id, "Deleted device");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    /// Write the full list to the backing file, if any.
    ///
    /// Callers hold the write lock across this call so writes land in order.
    async fn persist(&self, devices: &[DeviceDescriptor]) -> Result<(), StoreError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(devices)?;
        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(std::io::Error::other)??;
        Ok(())
    }
}

/// Write via a sibling temp file so readers never see a partial database
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn named(name: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_assigns_id() {
        let store = DeviceStore::in_memory();
        let saved = store.save(named("lamp")).await.unwrap();

        assert!(!saved.id.is_unassigned());
        assert_eq!(store.find_one(saved.id.as_str()).await, Some(saved));
    }

    #[tokio::test]
    async fn test_save_keeps_given_id_and_upserts() {
        let store = DeviceStore::in_memory();
        let mut d = named("lamp");
        d.id = DeviceId::from("7");
        store.save(d.clone()).await.unwrap();
        store.save(named("fan")).await.unwrap();

        d.name = Some("desk lamp".to_string());
        store.save(d).await.unwrap();

        let all = store.find_all().await;
        assert_eq!(all.len(), 2);
        // Replacement keeps insertion position
        assert_eq!(all[0].id.as_str(), "7");
        assert_eq!(all[0].name.as_deref(), Some("desk lamp"));
        assert_eq!(all[1].name.as_deref(), Some("fan"));
    }

    #[tokio::test]
    async fn test_find_all_is_a_snapshot() {
        let store = DeviceStore::in_memory();
        store.save(named("lamp")).await.unwrap();

        let mut all = store.find_all().await;
        all.clear();

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = DeviceStore::in_memory();
        let saved = store.save(named("lamp")).await.unwrap();

        store.delete(saved.id.as_str()).await.unwrap();
        assert!(store.find_one(saved.id.as_str()).await.is_none());
        assert!(store.is_empty().await);

        let err = store.delete(saved.id.as_str()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("device.db");

        let id = {
            let store = DeviceStore::open(&path).unwrap();
            store.save(named("lamp")).await.unwrap();
            let fan = store.save(named("fan")).await.unwrap();
            store.save(named("tv")).await.unwrap();
            store.delete(fan.id.as_str()).await.unwrap();
            fan.id
        };

        let reopened = DeviceStore::open(&path).unwrap();
        let names: Vec<String> = reopened
            .find_all()
            .await
            .into_iter()
            .filter_map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["lamp", "tv"]);
        assert!(reopened.find_one(id.as_str()).await.is_none());
    }

    #[tokio::test]
    async fn test_update_merges_in_place() {
        let store = DeviceStore::in_memory();
        let mut lamp = named("lamp");
        lamp.device_type = Some("dimmer".to_string());
        let lamp = store.save(lamp).await.unwrap();

        let update = DescriptorPayload {
            name: Some("desk lamp".to_string()),
            ..Default::default()
        };
        let updated = store.update(lamp.id.as_str(), update).await.unwrap().unwrap();

        assert_eq!(updated.id, lamp.id);
        assert_eq!(updated.name.as_deref(), Some("desk lamp"));
        assert_eq!(updated.device_type.as_deref(), Some("dimmer"));
        assert_eq!(store.find_one(lamp.id.as_str()).await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_of_deleted_device_does_not_recreate() {
        let store = DeviceStore::in_memory();
        let lamp = store.save(named("lamp")).await.unwrap();
        store.delete(lamp.id.as_str()).await.unwrap();

        let result = store
            .update(lamp.id.as_str(), DescriptorPayload::default())
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.find_one(lamp.id.as_str()).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("device.db");
        let store = DeviceStore::open(&good).unwrap();
        let lamp = store.save(named("lamp")).await.unwrap();

        // Parent of the database path is a regular file, so writes fail
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let broken = DeviceStore {
            devices: RwLock::new(store.find_all().await),
            path: Some(blocker.join("device.db")),
        };

        assert!(broken.save(named("fan")).await.is_err());
        assert_eq!(broken.len().await, 1);

        let update = DescriptorPayload {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        assert!(broken.update(lamp.id.as_str(), update).await.is_err());
        assert_eq!(
            broken.find_one(lamp.id.as_str()).await.unwrap().name.as_deref(),
            Some("lamp")
        );

        assert!(broken.delete(lamp.id.as_str()).await.is_err());
        assert_eq!(broken.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves() {
        let store = Arc::new(DeviceStore::in_memory());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save(named(&format!("device-{}", i))).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.len().await, 16);
    }
}
