//! # meshsim-proto::firmware
//!
//! Example firmware and mesh-protocol implementations demonstrating the
//! `Firmware`/`MeshProtocol` SDK.

#[cfg(feature = "flood_mesh")]
pub mod flood_mesh;

#[cfg(feature = "echo")]
pub mod echo;

#[cfg(feature = "counter")]
pub mod counter;

#[cfg(feature = "bridge")]
pub mod bridge;
