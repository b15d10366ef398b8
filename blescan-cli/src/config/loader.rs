use super::types::{
    BlescanConfig, DEFAULT_PERIOD_MS, PermissionsSection, RawBlescanConfig, RawPermissionsConfig,
    RawScanConfig, RawSimulatorConfig, ScanSection,
};
use anyhow::{Context, Result};
use blescan_core::SimulatorConfig;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<BlescanConfig> {
        let mut raw = RawBlescanConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "blescan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with BLESCAN_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("BLESCAN_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".blescan/config.toml")
        }
    }

    /// Load a single config file with defaults applied
    pub fn load_from_path(path: &Path) -> Result<BlescanConfig> {
        Ok(Self::finalize(Self::read_raw(path)?))
    }

    fn read_raw(path: &Path) -> Result<RawBlescanConfig> {
        debug!(path = %path.display(), "Reading config file");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawBlescanConfig, overlay: RawBlescanConfig) -> RawBlescanConfig {
        RawBlescanConfig {
            scan: RawScanConfig {
                period_ms: overlay.scan.period_ms.or(base.scan.period_ms),
            },
            simulator: RawSimulatorConfig {
                tick_ms: overlay.simulator.tick_ms.or(base.simulator.tick_ms),
                batch_size: overlay.simulator.batch_size.or(base.simulator.batch_size),
                fail_after_ticks: overlay
                    .simulator
                    .fail_after_ticks
                    .or(base.simulator.fail_after_ticks),
                available: overlay.simulator.available.or(base.simulator.available),
                devices: overlay.simulator.devices.or(base.simulator.devices),
            },
            permissions: RawPermissionsConfig {
                granted: overlay.permissions.granted.or(base.permissions.granted),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawBlescanConfig) -> BlescanConfig {
        let defaults = SimulatorConfig::default();
        BlescanConfig {
            scan: ScanSection {
                period_ms: raw.scan.period_ms.unwrap_or(DEFAULT_PERIOD_MS),
            },
            permissions: raw
                .permissions
                .granted
                .map(|granted| PermissionsSection { granted })
                .unwrap_or_default(),
            simulator: SimulatorConfig {
                tick_ms: raw.simulator.tick_ms.unwrap_or(defaults.tick_ms),
                batch_size: raw.simulator.batch_size.unwrap_or(defaults.batch_size),
                fail_after_ticks: raw.simulator.fail_after_ticks.or(defaults.fail_after_ticks),
                available: raw.simulator.available.unwrap_or(defaults.available),
                devices: raw.simulator.devices.unwrap_or(defaults.devices),
            },
        }
    }
}
