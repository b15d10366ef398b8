//! Permission boundary for radio discovery
//!
//! The scan session manager assumes the caller has already been authorized.
//! This module names the permissions a discovery session needs and gives
//! callers a single place to verify them before calling `toggle()`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// A platform permission required to run a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    BluetoothScan,
    /// Mandatory on most platforms to receive any scan results at all
    AccessCoarseLocation,
    AccessFineLocation,
}

impl Permission {
    /// Platform name of the permission
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::BluetoothScan => "BLUETOOTH_SCAN",
            Permission::AccessCoarseLocation => "ACCESS_COARSE_LOCATION",
            Permission::AccessFineLocation => "ACCESS_FINE_LOCATION",
        }
    }

    /// Request code used when asking the platform for this permission
    pub fn request_code(&self) -> u16 {
        match self {
            Permission::BluetoothScan => 100,
            Permission::AccessCoarseLocation => 101,
            Permission::AccessFineLocation => 102,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every permission a discovery session needs, in request order
pub fn required_permissions() -> [Permission; 3] {
    [
        Permission::BluetoothScan,
        Permission::AccessCoarseLocation,
        Permission::AccessFineLocation,
    ]
}

/// Answers whether a permission has been granted to the caller
///
/// Implemented by whatever authorization layer hosts the scanner.
pub trait PermissionGate {
    fn is_granted(&self, permission: Permission) -> bool;
}

/// A gate backed by a fixed set of granted permissions
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionGate {
    granted: HashSet<Permission>,
}

impl StaticPermissionGate {
    pub fn new(granted: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    /// A gate that grants every required permission
    pub fn all() -> Self {
        Self::new(required_permissions())
    }
}

impl PermissionGate for StaticPermissionGate {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }
}

/// Check every required permission against `gate`
///
/// Returns `ScanError::PermissionDenied` listing all missing permissions.
pub fn ensure_permissions(gate: &dyn PermissionGate) -> Result<(), ScanError> {
    let missing: Vec<Permission> = required_permissions()
        .into_iter()
        .filter(|p| !gate.is_granted(*p))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ScanError::PermissionDenied(missing))
    }
}
