//! Error types for blescan-core

use thiserror::Error;

use crate::permissions::Permission;
use crate::session::ScanState;

/// Top-level error type for scan session operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Missing permissions: {}", format_permissions(.0))]
    PermissionDenied(Vec<Permission>),

    #[error("Radio refused the request, permissions must be granted before scanning: {0}")]
    PreconditionFailed(String),

    #[error("Radio unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Session is already {0}")]
    AlreadyInState(ScanState),

    #[error("Radio driver failure: {0}")]
    DriverFailure(String),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Scan session manager is no longer running")]
    ManagerClosed,
}

/// Errors reported by a radio adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("Not authorized to use the radio: {0}")]
    Unauthorized(String),

    #[error("Radio unavailable: {0}")]
    Unavailable(String),

    #[error("Driver error: {0}")]
    Driver(String),
}

impl From<RadioError> for ScanError {
    fn from(err: RadioError) -> Self {
        match err {
            RadioError::Unauthorized(msg) => ScanError::PreconditionFailed(msg),
            RadioError::Unavailable(msg) => ScanError::ResourceUnavailable(msg),
            RadioError::Driver(msg) => ScanError::DriverFailure(msg),
        }
    }
}

/// A lifecycle hook reported failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
