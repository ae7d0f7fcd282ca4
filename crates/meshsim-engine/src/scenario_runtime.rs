//! # meshsim-engine::scenario_runtime
//!
//! Turns a parsed `meshsim_types::scenario::Scenario` into a ready-to-run
//! `World`: spawns every node, builds the static topology adjacency,
//! applies network defaults/overrides to `LinkState`, registers node
//! templates for runtime `NodeAdd` events, and schedules every `events[]`
//! entry onto the `EventScheduler` with its string aliases resolved to
//! `NodeId`s. Callers are expected to have already run `scenario.validate()`.

use fxhash::FxHashMap;
use meshsim_proto::FirmwareFactory;
use meshsim_types::id::{LinkKey, NodeId};
use meshsim_types::scenario::{EventAction, Scenario};

use crate::errors::EngineError;
use crate::events::Event;
use crate::topology_build::build_topology;
use crate::world::{NodeTemplate, World};

/// Builds a `World` from `scenario`, fully wired: nodes spawned (not yet
/// started — the Driver starts them via scheduled or implicit `NodeStart`
/// events), topology adjacency built, network defaults/overrides applied,
/// and every scenario event scheduled.
pub fn build_world(scenario: &Scenario, firmware_factories: FxHashMap<String, FirmwareFactory>) -> Result<World, EngineError> {
    let mut world = World::new(scenario.simulation.max_nodes, scenario.simulation.seed, firmware_factories);
    world.metrics_reset_on_restart = scenario.metrics.reset_on_restart;

    let mut alias_to_template = FxHashMap::default();
    for entry in &scenario.nodes {
        if let meshsim_types::scenario::NodeEntry::Template {
            template,
            firmware,
            mesh_group,
            ..
        } = entry
        {
            alias_to_template.insert(
                template.clone(),
                NodeTemplate {
                    mesh_group: mesh_group.clone(),
                    firmware: firmware.clone(),
                },
            );
        }
    }
    world.templates = alias_to_template;

    let mut spawned_ids = Vec::new();
    for config in scenario.expanded_nodes() {
        let id = world.spawn_node(config, None)?;
        spawned_ids.push(id);
    }

    let resolve = |alias: &str| world.registry.resolve_alias(alias);
    let adjacency = build_topology(&scenario.topology, &spawned_ids, resolve, &mut world.rng)?;
    world.adjacency = adjacency;

    apply_network_spec(&mut world, scenario)?;

    for id in &spawned_ids {
        world.start_node(*id)?;
    }

    for event in &scenario.events {
        let resolved = resolve_event(&world, &event.action)?;
        world.scheduler.schedule(event.time_ms, resolved, &mut world.ids);
    }

    Ok(world)
}

fn apply_network_spec(world: &mut World, scenario: &Scenario) -> Result<(), EngineError> {
    world
        .link_state
        .default_latency_set(scenario.network.latency.default)
        .map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
    world
        .link_state
        .default_loss_set(scenario.network.packet_loss.default)
        .map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
    world
        .link_state
        .default_bandwidth_set(scenario.network.bandwidth.default)
        .map_err(|e| EngineError::InvalidEvent(e.to_string()))?;

    for ov in &scenario.network.latency.overrides {
        let key = resolve_link(world, &ov.from, &ov.to)?;
        world
            .link_state
            .override_latency(key, ov.config)
            .map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
    }
    for ov in &scenario.network.packet_loss.overrides {
        let key = resolve_link(world, &ov.from, &ov.to)?;
        world
            .link_state
            .override_loss(key, ov.config)
            .map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
    }
    for ov in &scenario.network.bandwidth.overrides {
        let key = resolve_link(world, &ov.from, &ov.to)?;
        world
            .link_state
            .override_bandwidth(key, ov.config)
            .map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
    }
    Ok(())
}

fn resolve_link(world: &World, from: &str, to: &str) -> Result<LinkKey, EngineError> {
    let a = world.registry.resolve_alias(from).ok_or_else(|| EngineError::NotFound(from.to_string()))?;
    let b = world.registry.resolve_alias(to).ok_or_else(|| EngineError::NotFound(to.to_string()))?;
    Ok(LinkKey::new(a, b))
}

fn resolve_id(world: &World, alias: &str) -> Result<NodeId, EngineError> {
    world.registry.resolve_alias(alias).ok_or_else(|| EngineError::NotFound(alias.to_string()))
}

/// Converts one alias-addressed `EventAction` into an `Event` with
/// `NodeId`s resolved. `InjectMessage`'s `payload_hex` is decoded here
/// rather than in the schema, since hex decoding is a runtime concern, not
/// a document-shape concern.
fn resolve_event(world: &World, action: &EventAction) -> Result<Event, EngineError> {
    Ok(match action {
        EventAction::NodeStart { target } => Event::NodeStart(resolve_id(world, target)?),
        EventAction::NodeStop { target } => Event::NodeStop(resolve_id(world, target)?),
        EventAction::NodeCrash { target } => Event::NodeCrash(resolve_id(world, target)?),
        EventAction::NodeRestart { target } => Event::NodeRestart(resolve_id(world, target)?),
        EventAction::NodeAdd { count, template, id_prefix } => Event::NodeAdd {
            count: *count,
            template: template.clone(),
            id_prefix: id_prefix.clone(),
        },
        EventAction::NodeRemove { target } => Event::NodeRemove(resolve_id(world, target)?),
        EventAction::ConnectionDrop { a, b } => Event::ConnectionDrop(resolve_id(world, a)?, resolve_id(world, b)?),
        EventAction::ConnectionRestore { a, b } => Event::ConnectionRestore(resolve_id(world, a)?, resolve_id(world, b)?),
        EventAction::ConnectionDegrade { a, b, latency, loss } => Event::ConnectionDegrade {
            a: resolve_id(world, a)?,
            b: resolve_id(world, b)?,
            latency: *latency,
            loss: *loss,
        },
        EventAction::NetworkPartition { groups } => {
            let mut resolved_groups = Vec::with_capacity(groups.len());
            for group in groups {
                let mut resolved = Vec::with_capacity(group.len());
                for alias in group {
                    resolved.push(resolve_id(world, alias)?);
                }
                resolved_groups.push(resolved);
            }
            Event::NetworkPartition { groups: resolved_groups }
        }
        EventAction::NetworkHeal => Event::NetworkHeal,
        EventAction::InjectMessage { from, to, payload_hex } => {
            let bytes = decode_hex(payload_hex).map_err(|e| EngineError::InvalidEvent(e))?;
            let to = match to {
                Some(alias) => Some(resolve_id(world, alias)?),
                None => None,
            };
            Event::InjectMessage {
                from: resolve_id(world, from)?,
                to,
                payload: bytes.into(),
            }
        }
        EventAction::SetNetworkQuality { link, quality } => {
            let link = match link {
                Some((a, b)) => Some(resolve_link(world, a, b)?),
                None => None,
            };
            Event::SetNetworkQuality { link, quality: *quality }
        }
    })
}

/// Decodes a hex-encoded scenario payload into raw bytes. Scenario
/// documents are text, so binary payloads have to cross that boundary
/// somehow, and hex is a simple, unambiguous way to do it.
fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex payload: '{s}'"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsim_types::node_config::{MeshGroupConfig, NodeConfig};
    use meshsim_types::scenario::{EventSpec, MetricsSpec, NetworkSpec, NodeEntry, SimulationSpec};
    use meshsim_types::topology::TopologySpec;

    fn node(alias: &str) -> NodeConfig {
        NodeConfig {
            alias: alias.to_string(),
            mesh_group: MeshGroupConfig {
                prefix: "mesh".into(),
                password: "secret".into(),
                port: 4403,
            },
            firmware: None,
            firmware_params: Default::default(),
            partition_id: 0,
        }
    }

    fn factories() -> FxHashMap<String, FirmwareFactory> {
        let mut m: FxHashMap<String, FirmwareFactory> = FxHashMap::default();
        fn make_echo() -> Box<dyn meshsim_proto::Firmware> {
            Box::new(meshsim_proto::firmware::echo::Echo::default())
        }
        m.insert("echo".to_string(), make_echo);
        m
    }

    fn scenario() -> Scenario {
        Scenario {
            simulation: SimulationSpec {
                name: "two-node".into(),
                duration_s: Some(10),
                time_scale: 1.0,
                seed: 7,
                max_nodes: 10,
                tick_delta_ms: 10,
            },
            network: NetworkSpec::default(),
            nodes: vec![NodeEntry::Single(node("a")), NodeEntry::Single(node("b"))],
            topology: TopologySpec::Mesh,
            events: vec![EventSpec {
                time_ms: 500,
                action: EventAction::ConnectionDrop { a: "a".into(), b: "b".into() },
            }],
            metrics: MetricsSpec::default(),
        }
    }

    #[test]
    fn builds_world_with_two_started_nodes_and_scheduled_event() {
        let world = build_world(&scenario(), factories()).unwrap();
        assert_eq!(world.registry.len(), 2);
        assert_eq!(world.registry.running_ids().count(), 2);
        assert_eq!(world.scheduler.peek_time(), Some(500));
    }

    #[test]
    fn unknown_event_target_errors() {
        let mut s = scenario();
        s.events[0].action = EventAction::NodeStop { target: "ghost".into() };
        let err = build_world(&s, factories());
        assert!(err.is_err());
    }
}
