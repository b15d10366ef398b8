use blescan_core::{
    DEFAULT_SCAN_PERIOD, Permission, ScanConfig, Sighting, SimulatorConfig, required_permissions,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PERIOD_MS: u64 = DEFAULT_SCAN_PERIOD.as_millis() as u64;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBlescanConfig {
    #[serde(default)]
    pub scan: RawScanConfig,

    #[serde(default)]
    pub simulator: RawSimulatorConfig,

    #[serde(default)]
    pub permissions: RawPermissionsConfig,
}

/// Scan config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawScanConfig {
    pub period_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSimulatorConfig {
    pub tick_ms: Option<u64>,
    pub batch_size: Option<usize>,
    pub fail_after_ticks: Option<u32>,
    pub available: Option<bool>,
    pub devices: Option<Vec<Sighting>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPermissionsConfig {
    pub granted: Option<Vec<Permission>>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlescanConfig {
    #[serde(default)]
    pub scan: ScanSection,

    #[serde(default)]
    pub permissions: PermissionsSection,

    #[serde(default)]
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    /// Maximum length of one scan in milliseconds
    pub period_ms: u64,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

/// Permissions the simulated platform reports as granted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsSection {
    pub granted: Vec<Permission>,
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            granted: required_permissions().to_vec(),
        }
    }
}

impl BlescanConfig {
    /// Session manager config derived from the `[scan]` section
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::default().with_scan_period(Duration::from_millis(self.scan.period_ms))
    }
}
