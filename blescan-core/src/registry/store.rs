//! Deduplicating, insertion-ordered device registry

use std::collections::HashMap;

use super::device::{DiscoveredDevice, Sighting};

/// Collection of discovered devices keyed by address
///
/// Iteration follows first-sighting order. A sighting for an address that is
/// already present is ignored, so the first observed name is the one kept.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<DiscoveredDevice>,
    index: HashMap<String, usize>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting, returns true if a new entry was created
    pub fn record(&mut self, sighting: &Sighting) -> bool {
        if self.index.contains_key(&sighting.address) {
            return false;
        }

        self.index
            .insert(sighting.address.clone(), self.devices.len());
        self.devices.push(DiscoveredDevice::from_sighting(sighting));
        true
    }

    pub fn clear(&mut self) {
        self.devices.clear();
        self.index.clear();
    }

    pub fn get(&self, address: &str) -> Option<&DiscoveredDevice> {
        self.index.get(address).map(|&i| &self.devices[i])
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
