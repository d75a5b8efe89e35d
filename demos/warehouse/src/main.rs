//! warehouse — a small scripted run of the fleetgrid coordinator.
//!
//! Three robots cross a 10×10 floor while shelving is placed and removed
//! around them.  Every published event is printed to stdout as one JSON
//! line; logs go to stderr.
//!
//! ```text
//! cargo run -p warehouse                   # built-in defaults, with churn
//! cargo run -p warehouse -- fleet.json     # settings from a config file
//! RUST_LOG=debug cargo run -p warehouse    # per-operation logs
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use fg_core::FleetConfig;
use fg_sim::{Coordinator, EventBusError, TickDriver, load_config};

// ── Constants ─────────────────────────────────────────────────────────────────

const RUN_SECS:          u64 = 12;
const CHURN_INTERVAL_MS: u64 = 1_500;

// ── Script ────────────────────────────────────────────────────────────────────

// (delay before the command in ms, command JSON)
const SCRIPT: &[(u64, &str)] = &[
    (0,     r#"{"type":"create-robot","id":"amr-1","name":"Picker 1","position":{"x":0,"y":0},"target":{"x":9,"y":0}}"#),
    (0,     r#"{"type":"create-robot","id":"amr-2","name":"Picker 2","position":{"x":9,"y":9},"target":{"x":0,"y":9},"speed":2.0}"#),
    (0,     r#"{"type":"create-robot","id":"amr-3","name":"Tugger","position":{"x":0,"y":5},"target":{"x":9,"y":5},"speed":0.5}"#),
    (1_000, r#"{"type":"set-obstacle","x":4,"y":0,"obstacle":true}"#),
    (0,     r#"{"type":"set-obstacle","x":4,"y":1,"obstacle":true}"#),
    (1_500, r#"{"type":"set-robot-speed","id":"amr-3","speed":1.5}"#),
    (2_000, r#"{"type":"toggle-obstacle","x":5,"y":9}"#),
    (1_500, r#"{"type":"set-robot-target","id":"amr-1","target":{"x":0,"y":0}}"#),
    (1_000, r#"{"type":"set-robot-speed","id":"amr-2","speed":0}"#),
    (1_000, r#"{"type":"set-obstacle","x":4,"y":0,"obstacle":false}"#),
    (1_000, r#"{"type":"remove-robot","id":"amr-3"}"#),
];

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path).with_context(|| format!("Failed to load config {path}"))?,
        None => FleetConfig {
            churn_interval_ms: Some(CHURN_INTERVAL_MS),
            ..FleetConfig::default()
        },
    };
    init_logging(&config.log_level)?;

    let coordinator = Coordinator::from_config(&config).context("Failed to start coordinator")?;

    // ── Event printer ─────────────────────────────────────────────────────
    let mut events = coordinator.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "failed to encode event"),
                },
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });

    coordinator.publish_state().await?;

    // ── Tick driver ───────────────────────────────────────────────────────
    let driver = TickDriver::new(coordinator.clone(), &config)?;
    let stop = driver.shutdown_token();
    let ticking = tokio::spawn(driver.run());

    // ── Scripted commands ─────────────────────────────────────────────────
    for &(delay_ms, command) in SCRIPT {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        if let Err(e) = coordinator.apply_json(command).await {
            warn!(error = %e, command, "command rejected");
        }
    }

    tokio::time::sleep(Duration::from_secs(RUN_SECS)).await;
    stop.cancel();
    ticking.await.context("tick driver task failed")??;

    let metrics = coordinator.fleet().get_metrics().await?;
    info!(
        completed_tasks = metrics.completed_tasks,
        average_completion_ms = metrics.average_completion_ms,
        tasks_per_minute = metrics.tasks_per_minute,
        collisions_avoided = metrics.collisions_avoided,
        "run finished"
    );

    // Last bus handle: the printer drains what is left, then sees the bus close.
    drop(coordinator);
    printer.await.context("event printer task failed")?;
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
