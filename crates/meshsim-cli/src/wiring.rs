//! # meshsim-cli::wiring
//!
//! Builds the explicit, non-global firmware registry the engine resolves
//! `NodeConfig.firmware` names against, and turns a parsed `Scenario` into a
//! ready-to-run `World`. The registry is a plain value constructed here and
//! passed in — no `static`, no global lookup.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashMap;
use meshsim_engine::scenario_runtime;
use meshsim_engine::world::World;
use meshsim_proto::{Firmware, FirmwareFactory};
use meshsim_types::scenario::Scenario;

fn make_echo() -> Box<dyn Firmware> {
    Box::new(meshsim_proto::firmware::echo::Echo::default())
}

fn make_counter() -> Box<dyn Firmware> {
    Box::new(meshsim_proto::firmware::counter::Counter::default())
}

fn make_bridge() -> Box<dyn Firmware> {
    Box::new(meshsim_proto::firmware::bridge::Bridge::default())
}

/// The firmware names this binary knows how to instantiate, sorted for
/// stable `list-firmware` output.
pub fn firmware_registry() -> FxHashMap<String, FirmwareFactory> {
    let mut m: FxHashMap<String, FirmwareFactory> = FxHashMap::default();
    m.insert("echo".to_string(), make_echo);
    m.insert("counter".to_string(), make_counter);
    m.insert("bridge".to_string(), make_bridge);
    m
}

/// Reads and parses a scenario document, inferring YAML vs. TOML from the
/// file extension.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = fs::read_to_string(path).with_context(|| format!("reading scenario file {}", path.display()))?;
    let is_yaml = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => true,
        Some("toml") => false,
        other => anyhow::bail!("unsupported scenario file extension: {:?}", other),
    };
    Scenario::parse(&content, is_yaml).with_context(|| format!("parsing scenario file {}", path.display()))
}

/// Builds the `World` a scenario describes, wired with every compiled-in
/// firmware factory.
pub fn build_world(scenario: &Scenario) -> Result<World> {
    scenario_runtime::build_world(scenario, firmware_registry()).map_err(anyhow::Error::from)
}
