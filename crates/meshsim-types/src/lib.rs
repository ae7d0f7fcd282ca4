//! # meshsim-types
//!
//! Foundational, shared data types used across the entire meshsim workspace.
//! Its purpose is to break dependency cycles by providing a stable, central
//! location for types that `meshsim-engine`, `meshsim-proto`, `meshsim-cli`,
//! and `meshsim-tui` all need to agree upon.

#![forbid(unsafe_code)]

pub mod config;
pub mod envelope;
pub mod errors;
pub mod id;
pub mod metrics;
pub mod metrics_model;
pub mod node_config;
pub mod scenario;
pub mod time;
pub mod topology;
