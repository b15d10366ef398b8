//! Discovered-device bookkeeping
//!
//! The session manager only forwards raw sightings. [`DeviceRegistry`]
//! deduplicates them, and [`RegistrySink`] wires a shared registry into a
//! session as a subscriber plus a clearing before-hook.

mod device;
mod sink;
mod store;

pub use device::{DiscoveredDevice, Sighting};
pub use sink::{RegistrySink, SharedRegistry};
pub use store::DeviceRegistry;
