//! # meshsim-types::node_config
//!
//! Spawn-time parameters for a node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mesh-group credentials a node joins with. All three fields must be
/// non-empty once a node is actually spawned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshGroupConfig {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub port: u16,
}

/// The spawn-time description of one node, resolved from either an
/// individual scenario entry or a template expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// The scenario-authored alias; resolved to a numeric `NodeId` once by
    /// the registry and not consulted again afterward.
    pub alias: String,
    #[serde(default)]
    pub mesh_group: MeshGroupConfig,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub firmware_params: HashMap<String, String>,
    /// 0 = unpartitioned.
    #[serde(default)]
    pub partition_id: u32,
}
