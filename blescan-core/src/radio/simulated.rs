//! Simulated radio driven by a background OS thread
//!
//! Stands in for real discovery hardware: once started it reports the
//! configured devices from its own thread, the way a platform driver invokes
//! scan callbacks off the caller's event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::sink::RadioSink;
use super::traits::RadioAdapter;
use crate::error::RadioError;
use crate::registry::Sighting;

/// Behavior of a [`SimulatedRadio`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Delay between two reports
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Sightings per report; values above 1 are delivered as a batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Report a driver failure after this many reports
    #[serde(default)]
    pub fail_after_ticks: Option<u32>,

    /// When false the radio behaves as if the adapter is switched off
    #[serde(default = "default_available")]
    pub available: bool,

    /// Devices reported in round-robin order, repeats included
    #[serde(default)]
    pub devices: Vec<Sighting>,
}

fn default_tick_ms() -> u64 {
    250
}

fn default_batch_size() -> usize {
    1
}

fn default_available() -> bool {
    true
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            batch_size: default_batch_size(),
            fail_after_ticks: None,
            available: default_available(),
            devices: vec![
                Sighting::new("C4:7C:8D:6A:12:01")
                    .with_name("Flower care")
                    .with_rssi(-71),
                Sighting::new("E2:15:3A:90:44:7B").with_rssi(-88),
                Sighting::new("D0:03:DF:52:9C:1E")
                    .with_name("Heart Rate Strap")
                    .with_rssi(-56),
                Sighting::new("F1:22:B4:0C:6E:93")
                    .with_name("Tracker")
                    .with_rssi(-64),
            ],
        }
    }
}

impl SimulatorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

struct Worker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Radio adapter that fabricates sightings on a background thread
pub struct SimulatedRadio {
    config: SimulatorConfig,
    worker: Option<Worker>,
}

impl SimulatedRadio {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            worker: None,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    async fn join_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::SeqCst);

        // The thread may be sleeping for up to one tick
        let joined = tokio::task::spawn_blocking(move || worker.thread.join()).await;
        if !matches!(joined, Ok(Ok(()))) {
            warn!("Simulated radio thread did not exit cleanly");
        }
    }
}

#[async_trait]
impl RadioAdapter for SimulatedRadio {
    async fn start_discovery(&mut self, sink: RadioSink) -> Result<(), RadioError> {
        if !self.config.available {
            return Err(RadioError::Unavailable(
                "simulated adapter is switched off".to_string(),
            ));
        }
        // A thread that reported a fault has already exited on its own
        if self
            .worker
            .as_ref()
            .is_some_and(|worker| worker.thread.is_finished())
        {
            self.join_worker().await;
        }
        if self.worker.is_some() {
            return Err(RadioError::Driver("discovery already running".to_string()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let config = self.config.clone();
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("blescan-sim-radio".to_string())
            .spawn(move || run_driver(config, sink, thread_stop))
            .map_err(|e| RadioError::Driver(format!("failed to spawn driver thread: {e}")))?;

        debug!(devices = self.config.devices.len(), "Simulated discovery started");
        self.worker = Some(Worker { stop, thread });
        Ok(())
    }

    async fn stop_discovery(&mut self) -> Result<(), RadioError> {
        self.join_worker().await;
        debug!("Simulated discovery stopped");
        Ok(())
    }
}

fn run_driver(config: SimulatorConfig, sink: RadioSink, stop: Arc<AtomicBool>) {
    let mut cursor = config.devices.iter().cycle();
    let batch_size = config.batch_size.max(1);
    let mut ticks = 0u32;

    loop {
        thread::sleep(config.tick());
        if stop.load(Ordering::SeqCst) {
            return;
        }

        if config.fail_after_ticks.is_some_and(|limit| ticks >= limit) {
            sink.failed(format!("simulated driver fault after {ticks} reports"));
            return;
        }
        ticks += 1;

        let mut reported: Vec<Sighting> = cursor.by_ref().take(batch_size).cloned().collect();
        let delivered = match reported.len() {
            0 => true,
            1 => sink.sighting(reported.remove(0)),
            _ => sink.batch(reported),
        };
        if !delivered {
            return;
        }
    }
}
