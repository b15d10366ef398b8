//! Event type definitions

use serde::{Deserialize, Serialize};

use crate::registry::Sighting;
use crate::session::ScanState;

/// Events emitted by a scan session manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// A device was observed by the radio
    Sighting(Sighting),

    /// The radio or a lifecycle hook failed outside of a caller request
    Failure { reason: String },

    /// The session switched between idle and scanning
    StateChanged { state: ScanState },
}

impl ScanEvent {
    /// The sighting carried by this event, if any
    pub fn sighting(&self) -> Option<&Sighting> {
        match self {
            ScanEvent::Sighting(sighting) => Some(sighting),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScanEvent::Failure { .. })
    }
}
