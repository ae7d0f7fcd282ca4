//! # meshsim-cli::args
//!
//! Defines the command-line argument structure using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "human")]
    pub log: LogFormat,

    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation from a scenario file.
    Run(RunOpts),
    /// Validate a scenario file, printing every violation found.
    Validate {
        #[arg(value_name = "SCENARIO_PATH")]
        scenario: PathBuf,
    },
    /// List the firmware implementations compiled into this binary.
    ListFirmware,
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// Path to the scenario file (YAML or TOML).
    #[arg(value_name = "SCENARIO_PATH")]
    pub scenario: PathBuf,

    /// Override the RNG seed from the scenario file.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the scenario's duration, in seconds. 0 means unbounded.
    #[arg(long)]
    pub duration_s: Option<u64>,

    /// Override the scenario's time scale (1.0 = real time, 0 = as fast as possible).
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Run without the TUI, printing a summary to stdout instead.
    #[arg(long)]
    pub headless: bool,

    /// Minimum tracing level to emit.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory to write metric exports into, overriding `metrics.output`.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}
