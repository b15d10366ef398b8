//! blescan-core: Core library for time-bounded BLE discovery sessions
//!
//! This crate provides the building blocks of a scanner:
//!
//! - **Session management** - [`ScanSessionManager`] toggles a radio between
//!   idle and scanning, stops it automatically after the scan period and runs
//!   before/after lifecycle hooks
//! - **Radio port** - [`RadioAdapter`] trait implemented by drivers, with
//!   [`MockRadio`] for tests and [`SimulatedRadio`] for demos
//! - **Device registry** - [`DeviceRegistry`] deduplicates sightings by
//!   address; [`RegistrySink`] wires one into a session
//! - **Events** - [`ScanEvent`] delivered to every [`EventSink`] subscriber
//! - **Permissions** - [`ensure_permissions`] checks a [`PermissionGate`]
//!   before a caller asks for a scan
//!
//! # Quick Start
//!
//! ```no_run
//! use blescan_core::{
//!     RegistrySink, ScanConfig, ScanSessionManager, SimulatedRadio, SimulatorConfig,
//! };
//! use std::time::Duration;
//!
//! async fn example() -> Result<(), blescan_core::ScanError> {
//!     let radio = SimulatedRadio::new(SimulatorConfig::default());
//!     let config = ScanConfig::default().with_scan_period(Duration::from_secs(5));
//!     let manager = ScanSessionManager::with_config(radio, config);
//!
//!     // Keep a deduplicated view, emptied at the start of every session
//!     let registry = RegistrySink::new();
//!     manager.add_before_hook(registry.clear_hook()).await?;
//!     manager.subscribe(registry.clone()).await?;
//!
//!     manager.toggle().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//!  caller ──toggle()──▶ ┌──────────────────────────────┐
//!                       │        SessionActor          │──▶ EventSink(s)
//!  timer ──timeout────▶ │  state · hooks · subscribers │
//!                       │                              │──▶ RadioAdapter
//!  driver ──RadioSink─▶ └──────────────────────────────┘    start / stop
//! ```

pub mod error;
pub mod events;
pub mod hooks;
pub mod permissions;
pub mod radio;
pub mod registry;
pub mod session;

// Re-export key types for convenience
pub use error::{HookError, RadioError, ScanError};
pub use events::{ChannelSink, EventSink, ScanEvent, SubscriptionId};
pub use hooks::{Hook, HookStage, HookToken};
pub use permissions::{
    Permission, PermissionGate, StaticPermissionGate, ensure_permissions, required_permissions,
};
pub use radio::{
    MockRadio, MockRadioHandle, RadioAdapter, RadioEvent, RadioSink, SimulatedRadio,
    SimulatorConfig,
};
pub use registry::{DeviceRegistry, DiscoveredDevice, RegistrySink, SharedRegistry, Sighting};
pub use session::{DEFAULT_SCAN_PERIOD, ScanConfig, ScanSessionManager, ScanState};
