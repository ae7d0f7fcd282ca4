//! # meshsim-types::scenario
//!
//! The scenario document schema: the authoritative,
//! serde-driven description of a simulation run, parsed from YAML or TOML.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{BandwidthConfig, LatencyConfig, PacketLossConfig};
use crate::errors::ScenarioError;
use crate::node_config::NodeConfig;
use crate::time::{deserialize_sim_time_secs, SimTime};
use crate::topology::TopologySpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSpec {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub duration_s: Option<u64>,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "default_tick_delta_ms")]
    pub tick_delta_ms: u64,
}

fn default_time_scale() -> f64 {
    1.0
}
fn default_max_nodes() -> usize {
    1000
}
fn default_tick_delta_ms() -> u64 {
    10
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<u64> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|v| *v != 0))
}

impl SimulationSpec {
    /// Milliseconds the simulation should run for, or `None` if unbounded
    /// (`duration_s` of 0 or absent means "run until shutdown").
    pub fn duration_ms(&self) -> Option<SimTime> {
        self.duration_s.map(|s| s.saturating_mul(1_000))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSpec {
    #[serde(default)]
    pub latency: DefaultOverride<LatencyConfig>,
    #[serde(default)]
    pub packet_loss: DefaultOverride<PacketLossConfig>,
    #[serde(default)]
    pub bandwidth: DefaultOverride<BandwidthConfig>,
}

/// A scenario-wide default plus zero or more per-link overrides, matched by
/// `(from_alias, to_alias)` string pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultOverride<T> {
    pub default: T,
    #[serde(default)]
    pub overrides: Vec<LinkOverride<T>>,
}

impl<T: Default> Default for DefaultOverride<T> {
    fn default() -> Self {
        Self {
            default: T::default(),
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkOverride<T> {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub config: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeEntry {
    Single(NodeConfig),
    Template {
        template: String,
        count: usize,
        id_prefix: String,
        #[serde(default)]
        firmware: Option<String>,
        #[serde(default)]
        mesh_group: crate::node_config::MeshGroupConfig,
    },
}

impl NodeEntry {
    /// Expands this entry into the concrete `NodeConfig`s it produces.
    /// Templates expand to `count` nodes with identifiers
    /// `"{id_prefix}{i}"` for `i` in `[0, count)`.
    pub fn expand(&self) -> Vec<NodeConfig> {
        match self {
            NodeEntry::Single(cfg) => vec![cfg.clone()],
            NodeEntry::Template {
                count,
                id_prefix,
                firmware,
                mesh_group,
                ..
            } => (0..*count)
                .map(|i| NodeConfig {
                    alias: format!("{id_prefix}{i}"),
                    mesh_group: mesh_group.clone(),
                    firmware: firmware.clone(),
                    firmware_params: Default::default(),
                    partition_id: 0,
                })
                .collect(),
        }
    }
}

/// An action that modifies simulation state at a specific scheduled time,
/// matching the `Event` variant family one-to-one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EventAction {
    NodeStart { target: String },
    NodeStop { target: String },
    NodeCrash { target: String },
    NodeRestart { target: String },
    NodeAdd {
        count: usize,
        template: String,
        id_prefix: String,
    },
    NodeRemove { target: String },
    ConnectionDrop { a: String, b: String },
    ConnectionRestore { a: String, b: String },
    ConnectionDegrade {
        a: String,
        b: String,
        #[serde(default)]
        latency: Option<LatencyConfig>,
        #[serde(default)]
        loss: Option<PacketLossConfig>,
    },
    NetworkPartition { groups: Vec<Vec<String>> },
    NetworkHeal,
    InjectMessage {
        from: String,
        /// `None` means broadcast to every currently-running peer.
        to: Option<String>,
        payload_hex: String,
    },
    SetNetworkQuality {
        /// `None` applies the quality mapping scenario-wide.
        link: Option<(String, String)>,
        quality: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpec {
    #[serde(deserialize_with = "deserialize_sim_time_secs", rename = "time")]
    pub time_ms: SimTime,
    #[serde(flatten)]
    pub action: EventAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "graphviz")]
    Graphviz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSpec {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default = "default_interval_s")]
    pub interval_s: u64,
    #[serde(default)]
    pub collect: Vec<String>,
    #[serde(default)]
    pub export: Vec<ExportFormat>,
    #[serde(default)]
    pub reset_on_restart: bool,
}

fn default_interval_s() -> u64 {
    10
}

impl Default for MetricsSpec {
    fn default() -> Self {
        Self {
            output: None,
            interval_s: default_interval_s(),
            collect: Vec::new(),
            export: Vec::new(),
            reset_on_restart: false,
        }
    }
}

/// The top-level structure for a scenario definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub simulation: SimulationSpec,
    #[serde(default)]
    pub network: NetworkSpec,
    pub nodes: Vec<NodeEntry>,
    pub topology: TopologySpec,
    #[serde(default)]
    pub events: Vec<EventSpec>,
    #[serde(default)]
    pub metrics: MetricsSpec,
}

impl Scenario {
    pub fn parse(content: &str, is_yaml: bool) -> Result<Self, ScenarioError> {
        if is_yaml {
            Ok(serde_yaml::from_str(content)?)
        } else {
            Ok(toml::from_str(content)?)
        }
    }

    /// Expands every node entry (templates included) into concrete
    /// `NodeConfig`s, preserving declaration order.
    pub fn expanded_nodes(&self) -> Vec<NodeConfig> {
        self.nodes.iter().flat_map(NodeEntry::expand).collect()
    }

    /// Validates the scenario against every structural and semantic rule,
    /// returning every violation found rather than stopping at the first.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut violations = Vec::new();

        if self.simulation.name.trim().is_empty() {
            violations.push("simulation.name must be non-empty".to_string());
        }
        if self.simulation.time_scale <= 0.0 {
            violations.push("simulation.time_scale must be > 0".to_string());
        }
        if self.simulation.max_nodes == 0 {
            violations.push("simulation.max_nodes must be >= 1".to_string());
        }
        if self.simulation.tick_delta_ms == 0 {
            violations.push("simulation.tick_delta_ms must be > 0".to_string());
        }

        if let Err(e) = self.network.latency.default.validate() {
            violations.push(format!("network.latency.default: {e}"));
        }
        for ov in &self.network.latency.overrides {
            if let Err(e) = ov.config.validate() {
                violations.push(format!("network.latency override {}->{}: {e}", ov.from, ov.to));
            }
        }
        if let Err(e) = self.network.packet_loss.default.validate() {
            violations.push(format!("network.packet_loss.default: {e}"));
        }
        for ov in &self.network.packet_loss.overrides {
            if let Err(e) = ov.config.validate() {
                violations.push(format!("network.packet_loss override {}->{}: {e}", ov.from, ov.to));
            }
        }
        if let Err(e) = self.network.bandwidth.default.validate() {
            violations.push(format!("network.bandwidth.default: {e}"));
        }
        for ov in &self.network.bandwidth.overrides {
            if let Err(e) = ov.config.validate() {
                violations.push(format!("network.bandwidth override {}->{}: {e}", ov.from, ov.to));
            }
        }

        let nodes = self.expanded_nodes();
        let mut seen_aliases = HashSet::new();
        for node in &nodes {
            if !seen_aliases.insert(node.alias.clone()) {
                violations.push(format!("duplicate node id/alias '{}'", node.alias));
            }
            if node.mesh_group.prefix.trim().is_empty() || node.mesh_group.password.trim().is_empty() {
                violations.push(format!(
                    "node '{}': mesh_prefix and mesh_password must both be non-empty",
                    node.alias
                ));
            }
        }
        if nodes.len() > self.simulation.max_nodes {
            violations.push(format!(
                "{} nodes declared exceeds simulation.max_nodes ({})",
                nodes.len(),
                self.simulation.max_nodes
            ));
        }

        match &self.topology {
            TopologySpec::Star { hub } => {
                if !seen_aliases.contains(hub) {
                    violations.push(format!("topology.hub '{hub}' does not resolve to a defined node"));
                }
            }
            TopologySpec::Custom { connections } => {
                for (a, b) in connections {
                    if !seen_aliases.contains(a) {
                        violations.push(format!("topology.connections references undefined node '{a}'"));
                    }
                    if !seen_aliases.contains(b) {
                        violations.push(format!("topology.connections references undefined node '{b}'"));
                    }
                }
            }
            TopologySpec::Random { density } => {
                if !(0.0..=1.0).contains(density) {
                    violations.push("topology.density must be in [0,1]".to_string());
                }
            }
            TopologySpec::Mesh | TopologySpec::Ring { .. } => {}
        }

        let duration_ms = self.simulation.duration_ms();
        for (i, ev) in self.events.iter().enumerate() {
            if let Some(d) = duration_ms {
                if ev.time_ms > d {
                    violations.push(format!("event[{i}] time exceeds simulation duration"));
                }
            }
            self.validate_event_targets(i, &ev.action, &seen_aliases, &mut violations);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ScenarioError::Invalid {
                name: self.simulation.name.clone(),
                violations,
            })
        }
    }

    fn validate_event_targets(
        &self,
        i: usize,
        action: &EventAction,
        known: &HashSet<String>,
        violations: &mut Vec<String>,
    ) {
        let mut check = |alias: &str, violations: &mut Vec<String>| {
            if !known.contains(alias) {
                violations.push(format!("event[{i}] targets undefined node '{alias}'"));
            }
        };
        match action {
            EventAction::NodeStart { target }
            | EventAction::NodeStop { target }
            | EventAction::NodeCrash { target }
            | EventAction::NodeRestart { target }
            | EventAction::NodeRemove { target } => check(target, violations),
            EventAction::ConnectionDrop { a, b }
            | EventAction::ConnectionRestore { a, b }
            | EventAction::ConnectionDegrade { a, b, .. } => {
                check(a, violations);
                check(b, violations);
            }
            EventAction::NetworkPartition { groups } => {
                if groups.len() < 2 {
                    violations.push(format!("event[{i}] network_partition requires >= 2 groups"));
                }
                for g in groups {
                    if g.is_empty() {
                        violations.push(format!("event[{i}] network_partition has an empty group"));
                    }
                    for alias in g {
                        check(alias, violations);
                    }
                }
            }
            EventAction::InjectMessage { from, to, .. } => {
                check(from, violations);
                if let Some(to) = to {
                    check(to, violations);
                }
            }
            EventAction::SetNetworkQuality { link, quality } => {
                if let Some((a, b)) = link {
                    check(a, violations);
                    check(b, violations);
                }
                if !(0.0..=1.0).contains(quality) {
                    violations.push(format!("event[{i}] set_network_quality requires quality in [0,1]"));
                }
            }
            EventAction::NodeAdd { .. } | EventAction::NetworkHeal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_scenario() -> Scenario {
        Scenario {
            simulation: SimulationSpec {
                name: "two-node".to_string(),
                duration_s: Some(60),
                time_scale: 1.0,
                seed: 42,
                max_nodes: 1000,
                tick_delta_ms: 10,
            },
            network: NetworkSpec::default(),
            nodes: vec![
                NodeEntry::Single(NodeConfig {
                    alias: "1001".to_string(),
                    mesh_group: crate::node_config::MeshGroupConfig {
                        prefix: "mesh".to_string(),
                        password: "secret".to_string(),
                        port: 4403,
                    },
                    firmware: None,
                    firmware_params: Default::default(),
                    partition_id: 0,
                }),
                NodeEntry::Single(NodeConfig {
                    alias: "1002".to_string(),
                    mesh_group: crate::node_config::MeshGroupConfig {
                        prefix: "mesh".to_string(),
                        password: "secret".to_string(),
                        port: 4403,
                    },
                    firmware: None,
                    firmware_params: Default::default(),
                    partition_id: 0,
                }),
            ],
            topology: TopologySpec::Mesh,
            events: Vec::new(),
            metrics: MetricsSpec::default(),
        }
    }

    #[test]
    fn minimal_scenario_validates() {
        assert!(minimal_scenario().validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut s = minimal_scenario();
        s.simulation.name.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn duplicate_node_alias_is_rejected() {
        let mut s = minimal_scenario();
        let dup = s.nodes[0].clone();
        s.nodes.push(dup);
        assert!(s.validate().is_err());
    }

    #[test]
    fn event_targeting_unknown_node_is_rejected() {
        let mut s = minimal_scenario();
        s.events.push(EventSpec {
            time_ms: 1_000,
            action: EventAction::NodeStop {
                target: "9999".to_string(),
            },
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn partition_requires_at_least_two_groups() {
        let mut s = minimal_scenario();
        s.events.push(EventSpec {
            time_ms: 1_000,
            action: EventAction::NetworkPartition {
                groups: vec![vec!["1001".to_string()]],
            },
        });
        assert!(s.validate().is_err());
    }
}
