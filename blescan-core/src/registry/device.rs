//! Sighting and discovered-device records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of a remote device reported by the radio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    /// Device address, unique per physical device (case-sensitive)
    pub address: String,
    /// Advertised name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Received signal strength in dBm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i16>,
}

impl Sighting {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            rssi: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }
}

/// A device as first seen during a session
///
/// Never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    address: String,
    name: Option<String>,
    first_seen: DateTime<Utc>,
}

impl DiscoveredDevice {
    pub(crate) fn from_sighting(sighting: &Sighting) -> Self {
        Self {
            address: sighting.address.clone(),
            name: sighting.name.clone(),
            first_seen: Utc::now(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name suitable for display, falling back to the address when the
    /// advertised name is absent or blank
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.address,
        }
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }
}
