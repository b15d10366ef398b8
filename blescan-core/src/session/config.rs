//! Scan session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum length of one scanning period
pub const DEFAULT_SCAN_PERIOD: Duration = Duration::from_secs(10);

/// Configuration for a scan session manager
///
/// Fixed for the lifetime of the manager it is passed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// How long a session runs before it is stopped automatically
    #[serde(rename = "scan_period_ms", with = "duration_ms")]
    pub scan_period: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_period: DEFAULT_SCAN_PERIOD,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn with_scan_period(mut self, period: Duration) -> Self {
        self.scan_period = period;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
