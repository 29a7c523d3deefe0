//! Harmony hub state and the multi-hub home that relays it

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::warn;

use crate::hub::HarmonySource;

/// An activity configured on a Harmony hub
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub activity_order: Option<i32>,
    #[serde(rename = "isAVActivity", default)]
    pub is_av_activity: Option<bool>,
}

/// A device known to a Harmony hub
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarmonyDeviceInfo {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
}

/// Snapshot of a single hub
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarmonyState {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub current_activities: Vec<Activity>,
    #[serde(default)]
    pub devices: Vec<HarmonyDeviceInfo>,
}

/// An activity tagged with the hub it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonyActivity {
    pub hub: String,
    pub activity: Activity,
}

/// A device tagged with the hub it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonyDevice {
    pub hub: String,
    pub device: HarmonyDeviceInfo,
}

/// State of every configured Harmony hub, keyed by hub name
#[derive(Default)]
pub struct HarmonyHome {
    hubs: RwLock<BTreeMap<String, HarmonyState>>,
}

impl HarmonyHome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state held for `hub`
    pub fn update_hub(&self, hub: impl Into<String>, state: HarmonyState) {
        match self.hubs.write() {
            Ok(mut hubs) => {
                hubs.insert(hub.into(), state);
            }
            Err(e) => warn!(error = %e, "Harmony state lock poisoned, dropping update"),
        }
    }

    pub fn hub_names(&self) -> Vec<String> {
        self.hubs
            .read()
            .map(|hubs| hubs.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn collect_activities(
        &self,
        pick: impl Fn(&HarmonyState) -> &Vec<Activity>,
    ) -> Option<Vec<HarmonyActivity>> {
        let hubs = self.hubs.read().ok()?;
        Some(
            hubs.iter()
                .flat_map(|(hub, state)| {
                    pick(state).iter().map(move |a| HarmonyActivity {
                        hub: hub.clone(),
                        activity: a.clone(),
                    })
                })
                .collect(),
        )
    }
}

impl HarmonySource for HarmonyHome {
    fn activities(&self) -> Option<Vec<HarmonyActivity>> {
        self.collect_activities(|s| &s.activities)
    }

    fn current_activities(&self) -> Option<Vec<HarmonyActivity>> {
        self.collect_activities(|s| &s.current_activities)
    }

    fn devices(&self) -> Option<Vec<HarmonyDevice>> {
        let hubs = self.hubs.read().ok()?;
        Some(
            hubs.iter()
                .flat_map(|(hub, state)| {
                    state.devices.iter().map(move |d| HarmonyDevice {
                        hub: hub.clone(),
                        device: d.clone(),
                    })
                })
                .collect(),
        )
    }
}
