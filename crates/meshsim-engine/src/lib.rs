//! # meshsim-engine
//!
//! The core of the mesh network simulator. This crate owns the discrete
//! event loop, the per-node runtime arena, the network plane (latency,
//! loss, bandwidth, partitions), topology construction from a scenario
//! document, and the telemetry pipeline that feeds the CLI and TUI.

pub mod clock;
pub mod control;
pub mod driver;
pub mod errors;
pub mod events;
pub mod ids;
pub mod net;
pub mod node;
pub mod prelude;
pub mod rng;
pub mod scenario_runtime;
pub mod telemetry;
pub mod topology_build;
pub mod world;
