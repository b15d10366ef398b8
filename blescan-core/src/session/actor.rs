//! The task that owns a scan session
//!
//! Everything mutable about a session lives in [`SessionActor`] and is only
//! touched from its run loop. Two queues feed the loop: caller commands from
//! [`ScanSessionManager`](super::ScanSessionManager) handles, and signals from
//! the timeout timer and radio sinks, which may fire from any thread.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use super::config::ScanConfig;
use super::state::ScanState;
use super::timeout::PendingTimeout;
use crate::error::ScanError;
use crate::events::{EventSink, ScanEvent, SubscriptionId};
use crate::hooks::{Hook, HookList, HookStage, HookToken, run_hooks};
use crate::radio::{RadioAdapter, RadioEvent, RadioSink};

pub(crate) type Reply<T> = oneshot::Sender<T>;

/// Requests from manager handles
pub(crate) enum Command {
    Toggle {
        reply: Reply<Result<ScanState, ScanError>>,
    },
    Start {
        reply: Reply<Result<ScanState, ScanError>>,
    },
    Stop {
        reply: Reply<Result<ScanState, ScanError>>,
    },
    AddHook {
        stage: HookStage,
        hook: Hook,
        reply: Reply<HookToken>,
    },
    RemoveHook {
        token: HookToken,
        reply: Reply<bool>,
    },
    Subscribe {
        sink: Box<dyn EventSink>,
        reply: Reply<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: Reply<bool>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Asynchronous triggers not initiated by a caller
#[derive(Debug)]
pub(crate) enum Signal {
    Timeout { session: u64 },
    Radio { session: u64, event: RadioEvent },
}

/// Why a scanning session is being ended
#[derive(Debug)]
enum StopCause {
    Caller,
    Timeout,
    DriverFailure(String),
    Shutdown,
}

pub(crate) struct SessionActor {
    config: ScanConfig,
    radio: Box<dyn RadioAdapter>,
    state: ScanState,
    state_tx: watch::Sender<ScanState>,
    session_seq: u64,
    pending_timeout: Option<PendingTimeout>,
    before_hooks: HookList,
    after_hooks: HookList,
    subscribers: Vec<(SubscriptionId, Box<dyn EventSink>)>,
    next_subscription: u64,
    signal_tx: mpsc::UnboundedSender<Signal>,
}

impl SessionActor {
    pub(crate) fn new(
        config: ScanConfig,
        radio: Box<dyn RadioAdapter>,
        state_tx: watch::Sender<ScanState>,
        signal_tx: mpsc::UnboundedSender<Signal>,
    ) -> Self {
        Self {
            config,
            radio,
            state: ScanState::Idle,
            state_tx,
            session_seq: 0,
            pending_timeout: None,
            before_hooks: HookList::new(HookStage::Before),
            after_hooks: HookList::new(HookStage::After),
            subscribers: Vec::new(),
            next_subscription: 0,
            signal_tx,
        }
    }

    /// Process commands and signals until shut down or every handle is gone
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) {
        debug!(period = ?self.config.scan_period, "Scan session actor started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                Some(signal) = signals.recv() => self.handle_signal(signal).await,
            }
        }

        debug!("Scan session actor stopped");
    }

    /// Returns false once the actor should stop
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Toggle { reply } => {
                let result = match self.state {
                    ScanState::Idle => self.start_scan().await,
                    ScanState::Scanning => self.stop_scan(StopCause::Caller).await,
                };
                let _ = reply.send(result.map(|()| self.state));
            }
            Command::Start { reply } => {
                let result = match self.state {
                    ScanState::Idle => self.start_scan().await,
                    ScanState::Scanning => Err(ScanError::AlreadyInState(ScanState::Scanning)),
                };
                let _ = reply.send(result.map(|()| self.state));
            }
            Command::Stop { reply } => {
                let result = match self.state {
                    ScanState::Scanning => self.stop_scan(StopCause::Caller).await,
                    ScanState::Idle => Err(ScanError::AlreadyInState(ScanState::Idle)),
                };
                let _ = reply.send(result.map(|()| self.state));
            }
            Command::AddHook { stage, hook, reply } => {
                let token = match stage {
                    HookStage::Before => self.before_hooks.add(hook),
                    HookStage::After => self.after_hooks.add(hook),
                };
                let _ = reply.send(token);
            }
            Command::RemoveHook { token, reply } => {
                let removed = match token.stage() {
                    HookStage::Before => self.before_hooks.remove(token),
                    HookStage::After => self.after_hooks.remove(token),
                };
                let _ = reply.send(removed);
            }
            Command::Subscribe { sink, reply } => {
                let id = SubscriptionId(self.next_subscription);
                self.next_subscription += 1;
                self.subscribers.push((id, sink));
                let _ = reply.send(id);
            }
            Command::Unsubscribe { id, reply } => {
                let before = self.subscribers.len();
                self.subscribers.retain(|(existing, _)| *existing != id);
                let _ = reply.send(self.subscribers.len() != before);
            }
            Command::Shutdown { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Timeout { session } => {
                let armed = self
                    .pending_timeout
                    .as_ref()
                    .is_some_and(|t| t.session() == session);
                if !armed {
                    trace!(session, "Ignoring stale scan timeout");
                    return;
                }
                info!(session, "Scan period elapsed, stopping discovery");
                if let Err(e) = self.stop_scan(StopCause::Timeout).await {
                    error!(session, error = %e, "Automatic stop failed");
                }
            }
            Signal::Radio { session, event } => {
                if !self.is_current(session) {
                    trace!(session, current = self.session_seq, "Dropping report from ended session");
                    return;
                }
                match event {
                    RadioEvent::Sighting(sighting) => {
                        self.dispatch(&ScanEvent::Sighting(sighting));
                    }
                    RadioEvent::Batch(sightings) => {
                        trace!(session, count = sightings.len(), "Flattening sighting batch");
                        for sighting in sightings {
                            self.dispatch(&ScanEvent::Sighting(sighting));
                        }
                    }
                    RadioEvent::Failed { reason } => {
                        warn!(session, %reason, "Radio reported discovery failure");
                        if let Err(e) = self.stop_scan(StopCause::DriverFailure(reason)).await {
                            error!(session, error = %e, "Cleanup after driver failure failed");
                        }
                    }
                }
            }
        }
    }

    fn is_current(&self, session: u64) -> bool {
        self.state.is_scanning() && session == self.session_seq
    }

    async fn start_scan(&mut self) -> Result<(), ScanError> {
        let hooks = self.before_hooks.snapshot();
        run_hooks(&hooks)?;

        self.session_seq += 1;
        let session = self.session_seq;
        let timeout = PendingTimeout::arm(
            session,
            Instant::now() + self.config.scan_period,
            self.signal_tx.clone(),
        );
        let sink = RadioSink::new(session, self.signal_tx.clone());

        if let Err(e) = self.radio.start_discovery(sink).await {
            timeout.cancel();
            warn!(session, error = %e, "Radio refused to start discovery");
            return Err(e.into());
        }

        self.pending_timeout = Some(timeout);
        info!(session, period = ?self.config.scan_period, "Scan started");
        self.set_state(ScanState::Scanning);
        Ok(())
    }

    async fn stop_scan(&mut self, cause: StopCause) -> Result<(), ScanError> {
        let session = self.session_seq;
        let timeout = self.pending_timeout.take();

        // A fired timer has already delivered its one signal
        if !matches!(cause, StopCause::Timeout)
            && let Some(timeout) = &timeout
        {
            timeout.cancel();
        }

        let mut failure = None;
        match &cause {
            StopCause::DriverFailure(reason) => {
                // The driver has already ended discovery on its side
                failure = Some(reason.clone());
            }
            StopCause::Caller => {
                if let Err(e) = self.radio.stop_discovery().await {
                    warn!(session, error = %e, "Radio refused to stop discovery");
                    if let Some(timeout) = timeout {
                        self.pending_timeout = Some(PendingTimeout::arm(
                            session,
                            timeout.deadline(),
                            self.signal_tx.clone(),
                        ));
                    }
                    return Err(e.into());
                }
            }
            StopCause::Timeout | StopCause::Shutdown => {
                if let Err(e) = self.radio.stop_discovery().await {
                    warn!(session, error = %e, "Radio stop failed, forcing session to idle");
                    failure = Some(e.to_string());
                }
            }
        }

        let hooks = self.after_hooks.snapshot();
        let hook_result = run_hooks(&hooks);

        // Failures go out before the idle transition so a subscriber that
        // stops reading at idle has already seen them
        if let Some(reason) = failure {
            self.dispatch(&ScanEvent::Failure { reason });
        }
        if !matches!(cause, StopCause::Caller)
            && let Err(e) = &hook_result
        {
            self.dispatch(&ScanEvent::Failure {
                reason: format!("after-scan hook failed: {e}"),
            });
        }

        info!(session, ?cause, "Scan stopped");
        self.set_state(ScanState::Idle);

        hook_result.map_err(ScanError::from)
    }

    async fn shutdown(&mut self) {
        if self.state.is_scanning()
            && let Err(e) = self.stop_scan(StopCause::Shutdown).await
        {
            warn!(error = %e, "Error while stopping scan on shutdown");
        }
    }

    fn set_state(&mut self, state: ScanState) {
        debug!("Scan state: {} -> {}", self.state, state);
        self.state = state;
        self.state_tx.send_replace(state);
        self.dispatch(&ScanEvent::StateChanged { state });
    }

    fn dispatch(&mut self, event: &ScanEvent) {
        self.subscribers.retain_mut(|(id, sink)| {
            if sink.is_closed() {
                debug!(subscription = id.0, "Dropping closed subscriber");
                return false;
            }
            sink.on_event(event);
            true
        });
    }
}
