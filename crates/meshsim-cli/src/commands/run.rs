//! # meshsim-cli::commands::run
//!
//! Implements the `run` subcommand: load and validate a scenario, wire up
//! telemetry/control channels and an optional metric exporter, then drive
//! the simulation to completion headless or under the TUI.

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use meshsim_engine::control::DriverState;
use meshsim_engine::driver::{Driver, DriverConfig};
use meshsim_engine::telemetry::{self, TelemetryBus};
use meshsim_types::metrics_model::Snapshot;

use crate::args::{LogFormat, RunOpts};
use crate::export::Exporter;
use crate::logging::{HeadlessFormatter, SimulationFormatter};
use crate::wiring::{build_world, load_scenario};

pub fn exec(opts: RunOpts, log_format: LogFormat, log_file: Option<PathBuf>) -> Result<()> {
    init_tracing(&opts, log_format, log_file.as_deref())?;

    let mut scenario = load_scenario(&opts.scenario)?;

    if let Some(seed) = opts.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(duration_s) = opts.duration_s {
        scenario.simulation.duration_s = if duration_s == 0 { None } else { Some(duration_s) };
    }
    if let Some(scale) = opts.time_scale {
        scenario.simulation.time_scale = scale;
    }
    scenario.validate()?;

    let output_dir: Option<PathBuf> = opts.output.clone().or_else(|| scenario.metrics.output.clone().map(PathBuf::from));

    let world = build_world(&scenario)?;
    // `world.seed()` is the seed actually in effect: when the scenario
    // requested 0, `Rng::from_scenario_seed` already drew and logged a fresh
    // one during `build_world`, and this is the value to record for anyone
    // who wants to reproduce this exact run later.
    println!(
        "running scenario '{}' (seed {}, tick_delta_ms {})",
        scenario.simulation.name,
        world.seed(),
        scenario.simulation.tick_delta_ms
    );
    println!("nodes: {}", world.registry.len());

    let driver_config = DriverConfig {
        tick_delta_ms: scenario.simulation.tick_delta_ms,
        duration_ms: scenario.simulation.duration_ms(),
        time_scale: if opts.headless { 0.0 } else { scenario.simulation.time_scale },
        metrics_interval_ms: Some(scenario.metrics.interval_s.saturating_mul(1_000)),
    };
    let mut driver = Driver::new(world, driver_config);

    let shutdown = crate::shutdown::install()?;
    driver.set_shutdown_flag(shutdown);

    let use_tui = !opts.headless && cfg!(feature = "tui");
    if !opts.headless && !cfg!(feature = "tui") {
        println!("TUI requested but this binary was built without the 'tui' feature; running headless.");
    }

    let exporter_formats = scenario.metrics.export.clone();
    let want_export = output_dir.is_some() && !exporter_formats.is_empty();

    let (control_tx, control_rx) = crossbeam_channel::unbounded();
    driver.set_control_channel(control_rx);

    let mut export_handle = None;
    let mut tui_handle: Option<thread::JoinHandle<()>> = None;

    if use_tui || want_export {
        let (bus, rx) = TelemetryBus::channel(64);
        driver.set_telemetry(bus);

        if use_tui && want_export {
            let (tui_tx, tui_rx) = crossbeam_channel::unbounded::<Snapshot>();
            let (export_tx, export_rx) = crossbeam_channel::unbounded::<Snapshot>();
            thread::spawn(move || {
                for snapshot in rx.iter() {
                    let _ = tui_tx.send(snapshot.clone());
                    let _ = export_tx.send(snapshot);
                }
            });
            tui_handle = Some(spawn_tui(tui_rx, control_tx.clone()));
            export_handle = Some(spawn_exporter(output_dir.clone().unwrap(), exporter_formats, export_rx));
        } else if use_tui {
            tui_handle = Some(spawn_tui(rx, control_tx.clone()));
        } else {
            export_handle = Some(spawn_exporter(output_dir.clone().unwrap(), exporter_formats, rx));
        }
    }
    drop(control_tx);

    driver.run();

    let final_snapshot = telemetry::build(driver.world(), driver.now());
    print_summary(&final_snapshot);

    if let Some(handle) = tui_handle {
        let _ = handle.join();
    }
    if let Some(handle) = export_handle {
        let _ = handle.join();
    }

    if driver.state() != DriverState::Completed {
        anyhow::bail!("simulation did not reach a completed state");
    }
    Ok(())
}

/// Builds the global `tracing` subscriber for a `run` invocation. Kept
/// separate from `validate`/`list-firmware`, which use a plain default
/// subscriber in `main.rs`, since only a run has a headless/headful choice
/// and a simulation-time-aware formatter worth the extra setup.
fn init_tracing(opts: &RunOpts, log_format: LogFormat, log_file: Option<&std::path::Path>) -> Result<()> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(opts.log_level.clone()));

    let (writer, use_ansi) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    match log_format {
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init();
        }
        LogFormat::Human if opts.headless => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().event_format(HeadlessFormatter).with_writer(writer))
                .try_init();
        }
        LogFormat::Human => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .event_format(SimulationFormatter)
                        .with_writer(writer)
                        .with_ansi(use_ansi),
                )
                .try_init();
        }
    }
    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    println!("{}", "=".repeat(60));
    println!("simulation finished at sim_time {}ms", snapshot.sim_time);
    println!("nodes: {}", snapshot.nodes.len());
    for node in &snapshot.nodes {
        println!(
            "  {} (#{}) running={} sent={} recv={}",
            node.alias, node.id, node.running, node.messages_sent, node.messages_received
        );
    }
    let delivered: u64 = snapshot.links.iter().map(|l| l.messages_delivered).sum();
    let dropped: u64 = snapshot.links.iter().map(|l| l.messages_dropped_loss).sum();
    println!("links: {} (delivered={}, dropped_loss={})", snapshot.links.len(), delivered, dropped);
}

fn spawn_exporter(
    dir: PathBuf,
    formats: Vec<meshsim_types::scenario::ExportFormat>,
    rx: crossbeam_channel::Receiver<Snapshot>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || match Exporter::new(&dir, formats) {
        Ok(mut exporter) => {
            for snapshot in rx.iter() {
                if let Err(err) = exporter.write_snapshot(&snapshot) {
                    tracing::warn!(error = %err, "metric export failed");
                }
            }
        }
        Err(err) => tracing::warn!(error = %err, "metric exporter could not start"),
    })
}

#[cfg(feature = "tui")]
fn spawn_tui(
    rx: crossbeam_channel::Receiver<Snapshot>,
    control_tx: crossbeam_channel::Sender<meshsim_engine::control::ControlMsg>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(err) = meshsim_tui::run_tui(rx, control_tx) {
            eprintln!("TUI error: {err:?}");
        }
    })
}

#[cfg(not(feature = "tui"))]
fn spawn_tui(
    _rx: crossbeam_channel::Receiver<Snapshot>,
    _control_tx: crossbeam_channel::Sender<meshsim_engine::control::ControlMsg>,
) -> thread::JoinHandle<()> {
    thread::spawn(|| {})
}
