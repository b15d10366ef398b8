//! Run a single discovery session against the simulated radio.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use blescan_core::{
    ChannelSink, DiscoveredDevice, Hook, RegistrySink, ScanError, ScanEvent, ScanSessionManager,
    ScanState, Sighting, SimulatedRadio, StaticPermissionGate, ensure_permissions,
};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::config::{BlescanConfig, ConfigLoader};

/// Scan arguments.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Scan period in milliseconds (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub period_ms: Option<u64>,

    /// Print sightings and the device summary as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Stop the scan early after this many milliseconds
    #[arg(long)]
    pub stop_after_ms: Option<u64>,
}

/// Run scan command.
pub async fn run(args: ScanArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(period_ms) = args.period_ms {
        config.scan.period_ms = period_ms;
    }

    let gate = StaticPermissionGate::new(config.permissions.granted.iter().copied());
    ensure_permissions(&gate).context("cannot start a scan")?;

    let (devices, failure) = run_session(&config, &args).await?;

    if args.json {
        println!("{}", summary_json(&devices)?);
    } else if devices.is_empty() {
        println!("No devices found.");
    } else {
        println!("{}", device_table(&devices));
    }

    if let Some(reason) = failure {
        bail!("scan ended with a failure: {reason}");
    }
    Ok(())
}

/// Drive one session to completion, returning the devices found and the
/// first failure reported while it ran
async fn run_session(
    config: &BlescanConfig,
    args: &ScanArgs,
) -> Result<(Vec<DiscoveredDevice>, Option<String>)> {
    let radio = SimulatedRadio::new(config.simulator.clone());
    let manager = ScanSessionManager::with_config(radio, config.scan_config());

    let registry = RegistrySink::new();
    manager.add_before_hook(registry.clear_hook()).await?;
    manager.subscribe(registry.clone()).await?;

    if !args.json {
        let period_ms = config.scan.period_ms;
        manager
            .add_before_hook(Hook::new(move || {
                eprintln!("Scanning for up to {period_ms} ms, press Ctrl-C to stop");
            }))
            .await?;
        manager
            .add_after_hook(Hook::new(|| eprintln!("Scan finished")))
            .await?;
    }

    let (channel, mut events) = ChannelSink::new();
    manager.subscribe(channel).await?;

    manager.toggle().await.context("failed to start scan")?;
    info!(period_ms = config.scan.period_ms, "Scan running");

    let deadline = args
        .stop_after_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));
    let mut seen = HashSet::new();
    let mut failure = None;
    watch_events(&manager, &mut events, deadline, args.json, &mut seen, &mut failure).await?;

    let devices = registry.devices();

    // The actor drops the channel sink when it exits, so this reads every
    // event the session queued before the channel closes
    manager.shutdown().await?;
    while let Some(event) = events.recv().await {
        handle_event(&event, &mut seen, &mut failure, args.json)?;
    }

    Ok((devices, failure))
}

/// Print events until the session goes idle, stopping it on Ctrl-C or at
/// the stop-after deadline
async fn watch_events(
    manager: &ScanSessionManager,
    events: &mut UnboundedReceiver<ScanEvent>,
    deadline: Option<Instant>,
    json: bool,
    seen: &mut HashSet<String>,
    failure: &mut Option<String>,
) -> Result<()> {
    let mut stop_requested = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ScanEvent::StateChanged { state: ScanState::Idle }) | None => break,
                Some(event) => handle_event(&event, seen, failure, json)?,
            },
            _ = tokio::signal::ctrl_c(), if !stop_requested => {
                debug!("Interrupted, stopping scan");
                stop_requested = true;
                request_stop(manager).await?;
            }
            _ = wait_for(deadline), if !stop_requested => {
                debug!("Stop-after deadline reached");
                stop_requested = true;
                request_stop(manager).await?;
            }
        }
    }

    Ok(())
}

fn handle_event(
    event: &ScanEvent,
    seen: &mut HashSet<String>,
    failure: &mut Option<String>,
    json: bool,
) -> Result<()> {
    match event {
        ScanEvent::Sighting(sighting) => {
            if seen.insert(sighting.address.clone()) {
                print_sighting(event, sighting, json)?;
            }
        }
        ScanEvent::Failure { reason } => {
            warn!(%reason, "Scan reported a failure");
            failure.get_or_insert_with(|| reason.clone());
        }
        ScanEvent::StateChanged { state } => debug!(%state, "Session state changed"),
    }
    Ok(())
}

async fn request_stop(manager: &ScanSessionManager) -> Result<()> {
    match manager.stop().await {
        // The scan period ran out while the request was in flight
        Ok(_) | Err(ScanError::AlreadyInState(ScanState::Idle)) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("failed to stop scan")),
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn print_sighting(event: &ScanEvent, sighting: &Sighting, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        let name = sighting.name.as_deref().unwrap_or("<unnamed>");
        match sighting.rssi {
            Some(rssi) => println!("  {}  {name}  ({rssi} dBm)", sighting.address),
            None => println!("  {}  {name}", sighting.address),
        }
    }
    Ok(())
}

fn summary_json(devices: &[DiscoveredDevice]) -> Result<String> {
    let summary = serde_json::json!({
        "type": "summary",
        "devices": devices,
    });
    Ok(serde_json::to_string(&summary)?)
}

fn device_table(devices: &[DiscoveredDevice]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Address").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("First seen").fg(Color::Cyan),
    ]);

    for (i, device) in devices.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(device.address()),
            Cell::new(device.display_name()),
            Cell::new(device.first_seen().format("%H:%M:%S%.3f")),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use blescan_core::DeviceRegistry;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ScanArgs,
    }

    fn sample_devices() -> Vec<DiscoveredDevice> {
        let mut registry = DeviceRegistry::new();
        registry.record(&Sighting::new("AA:BB").with_name("Band"));
        registry.record(&Sighting::new("CC:DD"));
        registry.iter().cloned().collect()
    }

    // ==================== Argument Tests ====================

    #[test]
    fn parse_defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.args.period_ms.is_none());
        assert!(cli.args.stop_after_ms.is_none());
        assert!(!cli.args.json);
    }

    #[test]
    fn parse_all_flags() {
        let cli = TestCli::parse_from([
            "test",
            "--period-ms",
            "500",
            "--json",
            "--stop-after-ms",
            "200",
        ]);
        assert_eq!(cli.args.period_ms, Some(500));
        assert_eq!(cli.args.stop_after_ms, Some(200));
        assert!(cli.args.json);
    }

    #[test]
    fn parse_rejects_zero_period() {
        let result = TestCli::try_parse_from(["test", "--period-ms", "0"]);
        assert!(result.is_err());
    }

    // ==================== Output Tests ====================

    #[test]
    fn device_table_has_one_row_per_device() {
        let table = device_table(&sample_devices());
        let rendered = table.to_string();

        assert_eq!(table.row_iter().count(), 2);
        assert!(rendered.contains("AA:BB"));
        assert!(rendered.contains("Band"));
        assert!(rendered.contains("CC:DD"));
    }

    #[test]
    fn summary_json_lists_devices_in_order() {
        let json = summary_json(&sample_devices()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "summary");
        assert_eq!(value["devices"][0]["address"], "AA:BB");
        assert_eq!(value["devices"][1]["address"], "CC:DD");
    }

    // ==================== Event Handling Tests ====================

    #[test]
    fn handle_event_keeps_first_failure() {
        let mut seen = HashSet::new();
        let mut failure = None;

        for reason in ["first", "second"] {
            let event = ScanEvent::Failure {
                reason: reason.to_string(),
            };
            handle_event(&event, &mut seen, &mut failure, true).unwrap();
        }

        assert_eq!(failure.as_deref(), Some("first"));
    }

    #[test]
    fn handle_event_tracks_unique_addresses() {
        let mut seen = HashSet::new();
        let mut failure = None;

        for address in ["A", "B", "A"] {
            let event = ScanEvent::Sighting(Sighting::new(address));
            handle_event(&event, &mut seen, &mut failure, true).unwrap();
        }

        assert_eq!(seen.len(), 2);
        assert!(failure.is_none());
    }

    #[tokio::test]
    async fn session_runs_until_stop_after_deadline() {
        let mut config = BlescanConfig::default();
        config.scan.period_ms = 60_000;
        config.simulator.tick_ms = 5;
        let args = ScanArgs {
            period_ms: None,
            json: true,
            stop_after_ms: Some(100),
        };

        let (devices, failure) = run_session(&config, &args).await.unwrap();

        assert!(failure.is_none());
        assert!(!devices.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn session_reports_driver_failure() {
        let mut config = BlescanConfig::default();
        config.simulator.tick_ms = 5;
        config.simulator.fail_after_ticks = Some(2);
        let args = ScanArgs {
            period_ms: None,
            json: true,
            stop_after_ms: None,
        };

        let (devices, failure) = run_session(&config, &args).await.unwrap();

        assert_eq!(devices.len(), 2);
        assert!(failure.unwrap().contains("simulated driver fault"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn immediate_driver_failure_is_never_missed() {
        let mut config = BlescanConfig::default();
        config.simulator.tick_ms = 1;
        config.simulator.fail_after_ticks = Some(0);
        let args = ScanArgs {
            period_ms: None,
            json: true,
            stop_after_ms: None,
        };

        let mut missed = 0;
        for _ in 0..200 {
            let (_, failure) = run_session(&config, &args).await.unwrap();
            if failure.is_none() {
                missed += 1;
            }
        }

        assert_eq!(missed, 0, "driver failures missed in {missed}/200 sessions");
    }
}
