//! ScanSessionManager handle
//!
//! The manager is a cheap, cloneable handle. Each method sends a request to
//! the session actor and waits for its answer, so calls from several tasks
//! are applied one at a time in arrival order.

use tokio::sync::{mpsc, oneshot, watch};

use super::actor::{Command, Reply, SessionActor};
use super::config::ScanConfig;
use super::state::ScanState;
use crate::error::ScanError;
use crate::events::{EventSink, SubscriptionId};
use crate::hooks::{Hook, HookStage, HookToken};
use crate::radio::RadioAdapter;

/// Capacity of the caller command mailbox
const COMMAND_BUFFER: usize = 32;

/// Manages time-bounded discovery sessions on one radio
///
/// `toggle()` flips between idle and scanning. A started session stops on
/// its own after [`ScanConfig::scan_period`]. Before-hooks run ahead of every
/// start, after-hooks after every stop, whichever way the stop happened.
#[derive(Clone)]
pub struct ScanSessionManager {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ScanState>,
    config: ScanConfig,
}

impl ScanSessionManager {
    /// Create a manager with the default configuration
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(radio: impl RadioAdapter + 'static) -> Self {
        Self::with_config(radio, ScanConfig::default())
    }

    /// Create a manager with an explicit configuration
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_config(radio: impl RadioAdapter + 'static, config: ScanConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ScanState::Idle);

        let actor = SessionActor::new(config, Box::new(radio), state_tx, signal_tx);
        tokio::spawn(actor.run(command_rx, signal_rx));

        Self {
            commands: command_tx,
            state: state_rx,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Current session state
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn watch_state(&self) -> watch::Receiver<ScanState> {
        self.state.clone()
    }

    /// Start a session when idle, stop it when scanning
    ///
    /// Returns the state after the transition. Radio errors leave the state
    /// unchanged. Returns once the radio call has completed; results arrive
    /// through subscribers.
    pub async fn toggle(&self) -> Result<ScanState, ScanError> {
        self.request(|reply| Command::Toggle { reply }).await?
    }

    /// Start a session, failing with `AlreadyInState` if one is running
    pub async fn start(&self) -> Result<ScanState, ScanError> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Stop the running session, failing with `AlreadyInState` if idle
    pub async fn stop(&self) -> Result<ScanState, ScanError> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    pub async fn add_before_hook(&self, hook: Hook) -> Result<HookToken, ScanError> {
        self.add_hook(HookStage::Before, hook).await
    }

    pub async fn remove_before_hook(&self, token: HookToken) -> Result<bool, ScanError> {
        self.remove_hook(HookStage::Before, token).await
    }

    pub async fn add_after_hook(&self, hook: Hook) -> Result<HookToken, ScanError> {
        self.add_hook(HookStage::After, hook).await
    }

    pub async fn remove_after_hook(&self, token: HookToken) -> Result<bool, ScanError> {
        self.remove_hook(HookStage::After, token).await
    }

    /// Register a sink for sightings, failures and state changes
    pub async fn subscribe(&self, sink: impl EventSink) -> Result<SubscriptionId, ScanError> {
        let sink: Box<dyn EventSink> = Box::new(sink);
        self.request(|reply| Command::Subscribe { sink, reply })
            .await
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, ScanError> {
        self.request(|reply| Command::Unsubscribe { id, reply }).await
    }

    /// Stop any running session and end the actor
    ///
    /// Every other handle fails with `ManagerClosed` afterwards.
    pub async fn shutdown(&self) -> Result<(), ScanError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn add_hook(&self, stage: HookStage, hook: Hook) -> Result<HookToken, ScanError> {
        self.request(|reply| Command::AddHook { stage, hook, reply })
            .await
    }

    async fn remove_hook(&self, stage: HookStage, token: HookToken) -> Result<bool, ScanError> {
        if token.stage() != stage {
            return Ok(false);
        }
        self.request(|reply| Command::RemoveHook { token, reply })
            .await
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, ScanError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| ScanError::ManagerClosed)?;
        response.await.map_err(|_| ScanError::ManagerClosed)
    }
}
