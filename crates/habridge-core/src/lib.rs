//! HA Bridge Core - Device descriptors, device store, and hub snapshots
//!
//! This crate provides the foundational types for the HA Bridge device API:
//! - Virtual device descriptors and the create/update payload schema
//! - A concurrency-safe, optionally file-backed device store
//! - Read-only snapshot types for Vera and Harmony hubs

pub mod descriptor;
pub mod harmony;
pub mod hub;
pub mod store;
pub mod vera;

pub use descriptor::{DescriptorError, DescriptorPayload, DeviceDescriptor, DeviceId};
pub use harmony::{HarmonyActivity, HarmonyDevice, HarmonyHome, HarmonyState};
pub use hub::{HarmonySource, HubAggregator, VeraSource};
pub use store::{DeviceStore, StoreError};
pub use vera::{Sdata, VeraCache};
