//! # meshsim-types::topology
//!
//! Declarative network topology specifications. Node references here are the scenario's string aliases; the
//! engine resolves them to numeric `NodeId`s when building the initial
//! `LinkState` map, since topology is described before the registry exists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologySpec {
    /// Every pair of nodes is linked.
    Mesh,
    /// Nodes are connected in a ring: 0-1, 1-2, ..., (N-1)-0.
    Ring {
        #[serde(default)]
        bidirectional: bool,
    },
    /// All nodes connect to a central hub node.
    Star { hub: String },
    /// Each possible directed edge exists independently with probability
    /// `density`.
    Random { density: f64 },
    /// An explicit list of directed edges, given as alias pairs.
    Custom { connections: Vec<(String, String)> },
}

impl TopologySpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TopologySpec::Mesh => "mesh",
            TopologySpec::Ring { .. } => "ring",
            TopologySpec::Star { .. } => "star",
            TopologySpec::Random { .. } => "random",
            TopologySpec::Custom { .. } => "custom",
        }
    }
}
