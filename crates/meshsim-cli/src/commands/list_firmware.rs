//! # meshsim-cli::commands::list_firmware
//!
//! Implements the `list-firmware` subcommand: lists every registered
//! firmware by name, since the firmware registry is a plain
//! `name -> factory` map.

use anyhow::Result;

use crate::wiring::firmware_registry;

pub fn exec() -> Result<()> {
    let registry = firmware_registry();
    let mut names: Vec<&String> = registry.keys().collect();
    names.sort();

    println!("Available firmware:");
    for name in names {
        println!("  {name}");
    }
    Ok(())
}
