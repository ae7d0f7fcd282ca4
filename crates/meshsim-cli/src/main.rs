//! # meshsim-cli
//!
//! The main entry point for the meshsim binary. Parses command-line
//! arguments and dispatches to the appropriate subcommand handler.
//! Exit codes (`SPEC_FULL.md` §6.3): 0 on success, 2 on scenario validation
//! failure, 1 on any other unrecoverable error.

#![forbid(unsafe_code)]

use clap::Parser;

use crate::args::{Cli, Command};

mod args;
mod commands;
mod export;
mod logging;
mod shutdown;
mod wiring;

const EXIT_VALIDATION_FAILURE: i32 = 2;
const EXIT_RUNTIME_FAILURE: i32 = 1;

fn main() {
    let cli = Cli::parse();

    if !matches!(cli.command, Command::Run(_)) {
        let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
    }

    let result = match cli.command {
        Command::Run(opts) => commands::run::exec(opts, cli.log, cli.log_file),
        Command::ListFirmware => commands::list_firmware::exec(),
        Command::Validate { scenario } => commands::validate::exec(scenario),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        let code = if err.downcast_ref::<meshsim_types::errors::ScenarioError>().is_some() {
            EXIT_VALIDATION_FAILURE
        } else {
            EXIT_RUNTIME_FAILURE
        };
        std::process::exit(code);
    }
}
