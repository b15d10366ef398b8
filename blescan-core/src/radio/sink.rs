//! Driver-facing result sink

use tokio::sync::mpsc;
use tracing::trace;

use crate::registry::Sighting;
use crate::session::actor::Signal;

/// Raw report from a radio driver
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    Sighting(Sighting),
    /// Several sightings delivered at once; flattened in order by the manager
    Batch(Vec<Sighting>),
    /// The driver terminated discovery on its own
    Failed { reason: String },
}

/// Handle through which a driver reports results for one session
///
/// Every report is queued onto the owning manager's task; nothing is touched
/// from the caller's thread. Reports made after the session has ended are
/// dropped by the manager.
#[derive(Debug, Clone)]
pub struct RadioSink {
    session: u64,
    tx: mpsc::UnboundedSender<Signal>,
}

impl RadioSink {
    pub(crate) fn new(session: u64, tx: mpsc::UnboundedSender<Signal>) -> Self {
        Self { session, tx }
    }

    /// Number of the session this sink belongs to
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Report a raw event; returns false if the manager has shut down
    pub fn report(&self, event: RadioEvent) -> bool {
        let delivered = self
            .tx
            .send(Signal::Radio {
                session: self.session,
                event,
            })
            .is_ok();
        if !delivered {
            trace!(session = self.session, "Radio report after manager shutdown");
        }
        delivered
    }

    pub fn sighting(&self, sighting: Sighting) -> bool {
        self.report(RadioEvent::Sighting(sighting))
    }

    pub fn batch(&self, sightings: Vec<Sighting>) -> bool {
        self.report(RadioEvent::Batch(sightings))
    }

    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.report(RadioEvent::Failed {
            reason: reason.into(),
        })
    }

    /// A sink detached from any manager, paired with the receiving end
    #[cfg(test)]
    pub(crate) fn test_pair(session: u64) -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(session, tx), rx)
    }
}
