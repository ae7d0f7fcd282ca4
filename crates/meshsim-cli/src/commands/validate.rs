//! # meshsim-cli::commands::validate
//!
//! Implements the `validate` subcommand: parse, then run every rule in
//! `Scenario::validate`, printing every violation found rather than
//! stopping at the first.

use std::path::PathBuf;

use anyhow::Result;

use crate::wiring::load_scenario;

pub fn exec(path: PathBuf) -> Result<()> {
    let scenario = load_scenario(&path)?;
    scenario.validate()?;
    println!("scenario '{}' is valid", scenario.simulation.name);
    Ok(())
}
