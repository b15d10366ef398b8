//! Mock radio for testing
//!
//! MockRadio records every start/stop request and captures the sink it was
//! given, so tests can inject sightings and driver failures through the
//! paired [`MockRadioHandle`] exactly as a driver callback thread would.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::sink::RadioSink;
use super::traits::RadioAdapter;
use crate::error::RadioError;
use crate::registry::Sighting;

#[derive(Debug, Default)]
struct MockState {
    start_calls: usize,
    stop_calls: usize,
    active: bool,
    sink: Option<RadioSink>,
    start_failure: Option<RadioError>,
    stop_failure: Option<RadioError>,
}

/// Scriptable implementation of RadioAdapter
#[derive(Debug)]
pub struct MockRadio {
    state: Arc<Mutex<MockState>>,
}

/// Test-side handle sharing state with a [`MockRadio`]
#[derive(Debug, Clone)]
pub struct MockRadioHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockRadio {
    /// Create a mock radio together with its controlling handle
    pub fn new() -> (Self, MockRadioHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockRadioHandle { state },
        )
    }
}

#[async_trait]
impl RadioAdapter for MockRadio {
    async fn start_discovery(&mut self, sink: RadioSink) -> Result<(), RadioError> {
        let mut state = lock(&self.state);
        state.start_calls += 1;
        if let Some(err) = state.start_failure.take() {
            return Err(err);
        }
        if state.active {
            return Err(RadioError::Driver("discovery already running".to_string()));
        }
        state.active = true;
        state.sink = Some(sink);
        Ok(())
    }

    async fn stop_discovery(&mut self) -> Result<(), RadioError> {
        let mut state = lock(&self.state);
        state.stop_calls += 1;
        if let Some(err) = state.stop_failure.take() {
            return Err(err);
        }
        state.active = false;
        Ok(())
    }
}

impl MockRadioHandle {
    /// Make the next `start_discovery` call fail with `err`
    pub fn fail_next_start(&self, err: RadioError) {
        lock(&self.state).start_failure = Some(err);
    }

    /// Make the next `stop_discovery` call fail with `err`
    pub fn fail_next_stop(&self, err: RadioError) {
        lock(&self.state).stop_failure = Some(err);
    }

    /// Report a sighting through the most recent sink
    ///
    /// Returns false if discovery was never started or the manager is gone.
    pub fn emit(&self, sighting: Sighting) -> bool {
        self.sink().is_some_and(|sink| sink.sighting(sighting))
    }

    /// Report several sightings as one batch
    pub fn emit_batch(&self, sightings: Vec<Sighting>) -> bool {
        self.sink().is_some_and(|sink| sink.batch(sightings))
    }

    /// Report an asynchronous driver failure and mark the radio idle
    pub fn fail(&self, reason: &str) -> bool {
        let sink = {
            let mut state = lock(&self.state);
            state.active = false;
            state.sink.clone()
        };
        sink.is_some_and(|sink| sink.failed(reason))
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn stop_calls(&self) -> usize {
        lock(&self.state).stop_calls
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    /// Session number of the most recent sink, if any
    pub fn last_session(&self) -> Option<u64> {
        lock(&self.state).sink.as_ref().map(RadioSink::session)
    }

    fn sink(&self) -> Option<RadioSink> {
        lock(&self.state).sink.clone()
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
