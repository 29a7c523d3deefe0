//! Application state management

use anyhow::{Context, Result};
use habridge_core::{
    DeviceStore, HarmonyHome, HarmonySource, HarmonyState, HubAggregator, VeraCache,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, HarmonyConfig};

/// Shared application state
pub struct AppState {
    /// Registered device descriptors
    pub store: Arc<DeviceStore>,
    /// Vera snapshot, refreshed by the poller
    pub vera: Arc<VeraCache>,
    /// Read-only hub views
    pub hubs: HubAggregator,
    /// Version reported by the version endpoint
    pub version: String,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let store = if config.devices.db_path.is_empty() {
            info!("No device database configured, keeping devices in memory");
            DeviceStore::in_memory()
        } else {
            DeviceStore::open(&config.devices.db_path).with_context(|| {
                format!("Failed to open device database {}", config.devices.db_path)
            })?
        };

        let vera = Arc::new(VeraCache::new());
        let harmony = config
            .harmony
            .as_ref()
            .map(|h| Arc::new(load_harmony(h)) as Arc<dyn HarmonySource>);
        let hubs = HubAggregator::new(vera.clone(), harmony);
        if !hubs.has_harmony() {
            info!("No harmony hubs configured, harmony endpoints unavailable");
        }

        Ok(Arc::new(Self {
            store: Arc::new(store),
            vera,
            hubs,
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
        }))
    }
}

/// Build the harmony home from each hub's saved state, skipping unreadable hubs
fn load_harmony(config: &HarmonyConfig) -> HarmonyHome {
    let home = HarmonyHome::new();
    for hub in &config.hubs {
        match load_harmony_state(Path::new(&hub.snapshot)) {
            Ok(state) => {
                info!(
                    hub = %hub.name,
                    activities = state.activities.len(),
                    devices = state.devices.len(),
                    "Loaded harmony hub state"
                );
                home.update_hub(hub.name.clone(), state);
            }
            Err(e) => {
                warn!(hub = %hub.name, path = %hub.snapshot, error = %e, "Failed to load harmony hub state");
            }
        }
    }
    info!(hubs = ?home.hub_names(), "Harmony hubs ready");
    home
}

fn load_harmony_state(path: &Path) -> Result<HarmonyState> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
