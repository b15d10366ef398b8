//! Subscriber side of scan events

use tokio::sync::mpsc;

use super::ScanEvent;

/// Identifies a subscription so it can be removed later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Receives scan events from a session manager
///
/// Sinks are invoked on the manager's task, one event at a time and in the
/// order the radio reported them. They must not block.
pub trait EventSink: Send + 'static {
    fn on_event(&mut self, event: &ScanEvent);

    /// True once the sink can no longer deliver anything; the manager then
    /// drops the subscription
    fn is_closed(&self) -> bool {
        false
    }
}

impl<F> EventSink for F
where
    F: FnMut(&ScanEvent) + Send + 'static,
{
    fn on_event(&mut self, event: &ScanEvent) {
        self(event)
    }
}

/// Forwards every event into an unbounded channel
///
/// Useful when the consumer lives on another task and wants to `await`
/// events instead of reacting inline.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&mut self, event: &ScanEvent) {
        let _ = self.tx.send(event.clone());
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
