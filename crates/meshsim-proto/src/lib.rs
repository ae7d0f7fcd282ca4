//! # meshsim-proto
//!
//! The SDK for implementing mesh-routing logic and application firmware
//! that run inside `meshsim-engine`. Defines the capability-interface
//! traits (`Firmware`, `MeshProtocol`) and the context object (`FirmwareCtx`)
//! they use to interact with the simulation.

#![forbid(unsafe_code)]

pub mod api;
pub mod ctx_ext;
pub mod firmware;

pub use api::{Firmware, FirmwareFactory, MeshProtocol, SimCtx};
pub use ctx_ext::FirmwareCtx;
pub use firmware::flood_mesh::FloodMesh;
