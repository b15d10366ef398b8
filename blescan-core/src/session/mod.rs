//! Scan session management
//!
//! A [`ScanSessionManager`] is a cloneable handle to a single actor task that
//! owns the radio, the session state, the hook lists and the subscribers.
//! Caller requests, timeout fires and driver reports all reach that task
//! through its mailbox, so transitions never overlap.

pub(crate) mod actor;
pub mod config;
pub mod manager;
pub mod state;
mod timeout;

pub use config::{DEFAULT_SCAN_PERIOD, ScanConfig};
pub use manager::ScanSessionManager;
pub use state::ScanState;
