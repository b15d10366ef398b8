//! Cancellable auto-stop timer

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::actor::Signal;

/// The one outstanding auto-stop timer of a scanning session
///
/// When the deadline passes a `Signal::Timeout` tagged with the session
/// number is queued to the actor. Cancelling before the deadline guarantees
/// nothing is queued; a signal already queued is recognised as stale by its
/// session number.
#[derive(Debug)]
pub(crate) struct PendingTimeout {
    session: u64,
    deadline: Instant,
    token: CancellationToken,
}

impl PendingTimeout {
    pub(crate) fn arm(session: u64, deadline: Instant, tx: mpsc::UnboundedSender<Signal>) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    trace!(session, "Scan timeout cancelled");
                }
                _ = sleep_until(deadline) => {
                    let _ = tx.send(Signal::Timeout { session });
                }
            }
        });

        Self {
            session,
            deadline,
            token,
        }
    }

    pub(crate) fn session(&self) -> u64 {
        self.session
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timeout = PendingTimeout::arm(3, Instant::now() + Duration::from_millis(100), tx);
        assert_eq!(timeout.session(), 3);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(matches!(rx.try_recv(), Ok(Signal::Timeout { session: 3 })));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_deadline_prevents_signal() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timeout = PendingTimeout::arm(1, Instant::now() + Duration::from_millis(100), tx);

        tokio::time::sleep(Duration::from_millis(40)).await;
        timeout.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(rx.try_recv().is_err());
    }
}
