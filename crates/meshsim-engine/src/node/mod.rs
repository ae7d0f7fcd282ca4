//! # meshsim-engine::node
//!
//! Per-node runtime (`runtime`) and the owning arena (`registry`).

pub mod registry;
pub mod runtime;

pub use registry::NodeRegistry;
pub use runtime::VirtualNode;
