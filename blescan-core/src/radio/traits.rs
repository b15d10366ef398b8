//! RadioAdapter trait

use async_trait::async_trait;

use super::sink::RadioSink;
use crate::error::RadioError;

/// Abstract boundary to the discovery hardware
///
/// Implementations own the driver. Start and stop are treated as atomic
/// requests; the manager never cancels one in flight and never retries.
#[async_trait]
pub trait RadioAdapter: Send {
    /// Begin discovery, reporting sightings and failures to `sink`
    async fn start_discovery(&mut self, sink: RadioSink) -> Result<(), RadioError>;

    /// End discovery; sightings reported afterwards are discarded
    async fn stop_discovery(&mut self) -> Result<(), RadioError>;
}
