//! Read-only access to the external home-automation hubs
//!
//! The hubs themselves are polled and cached elsewhere. This module only
//! defines what a collaborator must expose and projects its snapshot into
//! the lists served by the API. A missing or failing collaborator always
//! reads as `None`.

use std::sync::Arc;

use crate::harmony::{HarmonyActivity, HarmonyDevice};
use crate::vera::{Sdata, VeraDevice, VeraScene};

/// A Vera controller's cached snapshot
pub trait VeraSource: Send + Sync {
    /// Latest snapshot, or `None` if the hub is unreachable or not configured
    fn snapshot(&self) -> Option<Sdata>;
}

/// A Harmony collaborator's cached state
pub trait HarmonySource: Send + Sync {
    fn activities(&self) -> Option<Vec<HarmonyActivity>>;
    fn current_activities(&self) -> Option<Vec<HarmonyActivity>>;
    fn devices(&self) -> Option<Vec<HarmonyDevice>>;
}

/// The two hub collaborators behind the API
#[derive(Clone)]
pub struct HubAggregator {
    vera: Arc<dyn VeraSource>,
    harmony: Option<Arc<dyn HarmonySource>>,
}

impl HubAggregator {
    pub fn new(vera: Arc<dyn VeraSource>, harmony: Option<Arc<dyn HarmonySource>>) -> Self {
        Self { vera, harmony }
    }

    pub fn has_harmony(&self) -> bool {
        self.harmony.is_some()
    }

    pub fn vera_devices(&self) -> Option<Vec<VeraDevice>> {
        self.vera.snapshot().map(|s| s.devices)
    }

    pub fn vera_scenes(&self) -> Option<Vec<VeraScene>> {
        self.vera.snapshot().map(|s| s.scenes)
    }

    pub fn harmony_activities(&self) -> Option<Vec<HarmonyActivity>> {
        self.harmony.as_ref()?.activities()
    }

    pub fn harmony_current_activities(&self) -> Option<Vec<HarmonyActivity>> {
        self.harmony.as_ref()?.current_activities()
    }

    pub fn harmony_devices(&self) -> Option<Vec<HarmonyDevice>> {
        self.harmony.as_ref()?.devices()
    }
}
