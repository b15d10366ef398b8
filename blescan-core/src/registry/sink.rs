//! Registry-backed event sink

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::device::DiscoveredDevice;
use super::store::DeviceRegistry;
use crate::events::{EventSink, ScanEvent};
use crate::hooks::Hook;

/// A registry shared between a session and its readers
pub type SharedRegistry = Arc<Mutex<DeviceRegistry>>;

/// Records every sighting into a shared [`DeviceRegistry`]
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct RegistrySink {
    registry: SharedRegistry,
}

impl RegistrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Before-hook that empties the registry so each session starts fresh
    pub fn clear_hook(&self) -> Hook {
        let registry = Arc::clone(&self.registry);
        Hook::new(move || lock(&registry).clear())
    }

    /// Devices recorded so far, in first-sighting order
    pub fn devices(&self) -> Vec<DiscoveredDevice> {
        lock(&self.registry).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.registry).is_empty()
    }
}

impl EventSink for RegistrySink {
    fn on_event(&mut self, event: &ScanEvent) {
        if let ScanEvent::Sighting(sighting) = event
            && lock(&self.registry).record(sighting)
        {
            debug!(address = %sighting.address, "New device discovered");
        }
    }
}

// A panic inside another holder leaves the registry data intact, so keep using it
fn lock(registry: &SharedRegistry) -> MutexGuard<'_, DeviceRegistry> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
