//! Integration tests for scan session lifecycles
//!
//! These tests drive a full ScanSessionManager through its public API:
//! - Timed sessions with a registry cleared by a before-hook
//! - Hook ordering across start and stop
//! - Reports arriving from a foreign driver thread

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};

use blescan_core::{
    ChannelSink, Hook, MockRadio, RegistrySink, ScanConfig, ScanEvent, ScanSessionManager,
    ScanState, Sighting, SimulatedRadio, SimulatorConfig,
};

fn manager_with_period(period: Duration) -> (ScanSessionManager, blescan_core::MockRadioHandle) {
    let (radio, handle) = MockRadio::new();
    let manager =
        ScanSessionManager::with_config(radio, ScanConfig::default().with_scan_period(period));
    (manager, handle)
}

#[tokio::test(start_paused = true)]
async fn timed_session_with_registry_reset() {
    let (manager, radio) = manager_with_period(Duration::from_millis(100));
    let registry = RegistrySink::new();
    let after_runs = Arc::new(Mutex::new(0u32));

    manager.add_before_hook(registry.clear_hook()).await.unwrap();
    let counter = Arc::clone(&after_runs);
    manager
        .add_after_hook(Hook::new(move || *counter.lock().unwrap() += 1))
        .await
        .unwrap();
    manager.subscribe(registry.clone()).await.unwrap();

    let t0 = Instant::now();

    // t=0: start
    assert_eq!(manager.toggle().await.unwrap(), ScanState::Scanning);

    // t=20ms: one sighting
    sleep_until(t0 + Duration::from_millis(20)).await;
    assert!(radio.emit(Sighting::new("D1")));
    sleep_until(t0 + Duration::from_millis(25)).await;
    assert_eq!(registry.len(), 1);

    // t=100ms: timer fires
    sleep_until(t0 + Duration::from_millis(110)).await;
    assert_eq!(manager.state(), ScanState::Idle);
    assert_eq!(*after_runs.lock().unwrap(), 1);
    assert_eq!(registry.len(), 1);

    // t=150ms: fresh session, registry emptied by the before-hook
    sleep_until(t0 + Duration::from_millis(150)).await;
    assert_eq!(manager.toggle().await.unwrap(), ScanState::Scanning);
    assert_eq!(registry.len(), 0);
    assert_eq!(*after_runs.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn hooks_bracket_the_radio_calls() {
    let (manager, radio) = manager_with_period(Duration::from_secs(10));
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    for (stage, name) in [("before", "b1"), ("before", "b2"), ("after", "a1"), ("after", "a2")] {
        let log = Arc::clone(&log);
        let probe = radio.clone();
        let hook = Hook::new(move || {
            log.lock()
                .unwrap()
                .push(format!("{name}:active={}", probe.is_active()));
        });
        if stage == "before" {
            manager.add_before_hook(hook).await.unwrap();
        } else {
            manager.add_after_hook(hook).await.unwrap();
        }
    }

    manager.toggle().await.unwrap();
    manager.toggle().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "b1:active=false",
            "b2:active=false",
            "a1:active=false",
            "a2:active=false",
        ]
    );
    assert_eq!(radio.start_calls(), 1);
    assert_eq!(radio.stop_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn event_stream_for_a_timed_out_session() {
    let (manager, radio) = manager_with_period(Duration::from_millis(50));
    let (sink, mut events) = ChannelSink::new();
    manager.subscribe(sink).await.unwrap();

    manager.toggle().await.unwrap();
    radio.emit_batch(vec![Sighting::new("A").with_name("x"), Sighting::new("B")]);
    sleep(Duration::from_millis(80)).await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            ScanEvent::StateChanged {
                state: ScanState::Scanning
            },
            ScanEvent::Sighting(Sighting::new("A").with_name("x")),
            ScanEvent::Sighting(Sighting::new("B")),
            ScanEvent::StateChanged {
                state: ScanState::Idle
            },
        ]
    );
}

#[tokio::test]
async fn simulated_driver_thread_feeds_registry() {
    let radio = SimulatedRadio::new(SimulatorConfig {
        devices: vec![
            Sighting::new("AA").with_name("first"),
            Sighting::new("BB"),
            Sighting::new("AA").with_name("second"),
        ],
        tick_ms: 2,
        ..SimulatorConfig::default()
    });
    let manager = ScanSessionManager::with_config(
        radio,
        ScanConfig::default().with_scan_period(Duration::from_millis(200)),
    );
    let registry = RegistrySink::new();
    manager.subscribe(registry.clone()).await.unwrap();
    let mut state = manager.watch_state();

    manager.toggle().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while *state.borrow_and_update() != ScanState::Idle {
            if state.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("session should time out");

    let devices = registry.devices();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].address(), "AA");
    assert_eq!(devices[0].name(), Some("first"));
    assert_eq!(devices[1].address(), "BB");
}

#[tokio::test]
async fn simulated_driver_failure_reaches_subscribers() {
    let radio = SimulatedRadio::new(SimulatorConfig {
        devices: vec![Sighting::new("AA")],
        tick_ms: 2,
        fail_after_ticks: Some(3),
        ..SimulatorConfig::default()
    });
    let manager = ScanSessionManager::new(radio);
    let (sink, mut events) = ChannelSink::new();
    manager.subscribe(sink).await.unwrap();

    manager.toggle().await.unwrap();

    let failure = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if let ScanEvent::Failure { reason } = event {
                return Some(reason);
            }
        }
        None
    })
    .await
    .expect("driver failure should be reported");

    assert!(failure.unwrap().contains("simulated driver fault"));
    assert_eq!(manager.state(), ScanState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failure_is_seen_by_consumers_that_stop_at_idle() {
    for _ in 0..50 {
        let radio = SimulatedRadio::new(SimulatorConfig {
            devices: vec![Sighting::new("AA")],
            tick_ms: 1,
            fail_after_ticks: Some(0),
            ..SimulatorConfig::default()
        });
        let manager = ScanSessionManager::new(radio);
        let (sink, mut events) = ChannelSink::new();
        manager.subscribe(sink).await.unwrap();
        manager.toggle().await.unwrap();

        let saw_failure = tokio::time::timeout(Duration::from_secs(5), async {
            let mut saw_failure = false;
            while let Some(event) = events.recv().await {
                match event {
                    ScanEvent::Failure { .. } => saw_failure = true,
                    ScanEvent::StateChanged {
                        state: ScanState::Idle,
                    } => break,
                    _ => {}
                }
            }
            saw_failure
        })
        .await
        .expect("session should go idle");

        assert!(saw_failure, "failure must arrive before the idle transition");
        manager.shutdown().await.unwrap();
    }
}
