//! Vera hub snapshot (`sdata`) types
//!
//! Vera reports ids, rooms and categories as numbers. They are carried as
//! strings so the relayed JSON stays uniform regardless of firmware.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

use crate::hub::VeraSource;

/// Point-in-time view of a Vera controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sdata {
    #[serde(default)]
    pub devices: Vec<VeraDevice>,
    #[serde(default)]
    pub scenes: Vec<VeraScene>,
    #[serde(default)]
    pub rooms: Vec<VeraRoom>,
    #[serde(default)]
    pub categories: Vec<VeraCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VeraDevice {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub altid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VeraScene {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub active: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VeraRoom {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub section: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VeraCategory {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Sdata {
    /// Replace room and category ids on devices and scenes with display names.
    ///
    /// Ids without a matching room or category are left untouched.
    pub fn resolve_names(&mut self) {
        let rooms: HashMap<&str, &str> = self
            .rooms
            .iter()
            .map(|r| (r.id.as_str(), r.name.as_str()))
            .collect();
        let categories: HashMap<&str, &str> = self
            .categories
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();

        for device in &mut self.devices {
            if let Some(name) = rooms.get(device.room.as_str()) {
                device.room = name.to_string();
            }
            if let Some(name) = categories.get(device.category.as_str()) {
                device.category = name.to_string();
            }
        }
        for scene in &mut self.scenes {
            if let Some(name) = rooms.get(scene.room.as_str()) {
                scene.room = name.to_string();
            }
        }
    }
}

/// Accept a JSON string, number or bool and keep it as a string
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Latest Vera snapshot, written by a poller and read by request handlers
#[derive(Default)]
pub struct VeraCache {
    sdata: RwLock<Option<Sdata>>,
}

impl VeraCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held snapshot; `None` marks the hub unreachable
    pub fn set(&self, sdata: Option<Sdata>) {
        match self.sdata.write() {
            Ok(mut guard) => *guard = sdata,
            Err(e) => warn!(error = %e, "Vera snapshot lock poisoned, dropping update"),
        }
    }
}

impl VeraSource for VeraCache {
    fn snapshot(&self) -> Option<Sdata> {
        self.sdata.read().ok()?.clone()
    }
}
