//! # meshsim-engine::topology_build
//!
//! Builds the static node-adjacency graph a scenario's `topology` section
//! describes, resolving string aliases to `NodeId`s. This
//! is deliberately separate from `LinkState`: adjacency says who a node's
//! radio can reach at all, `LinkState` says how well a reachable link
//! performs. Builds adjacency for all five topology kinds, including the
//! two that are directed (`Ring` without `bidirectional`, `Random`).

use fxhash::FxHashMap;
use meshsim_types::id::NodeId;
use meshsim_types::topology::TopologySpec;
use rand::Rng as _;

use crate::errors::EngineError;
use crate::rng::Rng;

/// Resolves a scenario alias to its assigned `NodeId`, or an error naming
/// the alias if the topology references one that was never declared.
/// `Scenario::validate` is expected to have already caught this, but
/// `topology_build` re-checks so it never panics on a malformed document
/// that skipped validation.
pub fn build_topology<F>(
    spec: &TopologySpec,
    ids: &[NodeId],
    resolve: F,
    rng: &mut Rng,
) -> Result<FxHashMap<NodeId, Vec<NodeId>>, EngineError>
where
    F: Fn(&str) -> Option<NodeId>,
{
    let mut adjacency: FxHashMap<NodeId, Vec<NodeId>> = ids.iter().map(|&id| (id, Vec::new())).collect();

    match spec {
        TopologySpec::Mesh => {
            for &a in ids {
                for &b in ids {
                    if a != b {
                        adjacency.get_mut(&a).unwrap().push(b);
                    }
                }
            }
        }
        TopologySpec::Ring { bidirectional } => {
            let n = ids.len();
            for i in 0..n {
                let next = ids[(i + 1) % n];
                adjacency.get_mut(&ids[i]).unwrap().push(next);
                if *bidirectional {
                    adjacency.get_mut(&next).unwrap().push(ids[i]);
                }
            }
        }
        TopologySpec::Star { hub } => {
            let hub_id = resolve(hub).ok_or_else(|| EngineError::NotFound(hub.clone()))?;
            for &id in ids {
                if id != hub_id {
                    adjacency.get_mut(&hub_id).unwrap().push(id);
                    adjacency.get_mut(&id).unwrap().push(hub_id);
                }
            }
        }
        TopologySpec::Random { density } => {
            for &a in ids {
                for &b in ids {
                    if a != b && rng.inner_mut().gen_bool(density.clamp(0.0, 1.0)) {
                        adjacency.get_mut(&a).unwrap().push(b);
                    }
                }
            }
        }
        TopologySpec::Custom { connections } => {
            for (a, b) in connections {
                let a_id = resolve(a).ok_or_else(|| EngineError::NotFound(a.clone()))?;
                let b_id = resolve(b).ok_or_else(|| EngineError::NotFound(b.clone()))?;
                adjacency.get_mut(&a_id).unwrap().push(b_id);
            }
        }
    }

    Ok(adjacency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<NodeId> {
        (1..=n).map(|i| NodeId::new(i).unwrap()).collect()
    }

    #[test]
    fn mesh_connects_every_pair_both_ways() {
        let nodes = ids(4);
        let mut rng = Rng::from_scenario_seed(1);
        let adj = build_topology(&TopologySpec::Mesh, &nodes, |_| None, &mut rng).unwrap();
        for &n in &nodes {
            assert_eq!(adj[&n].len(), 3);
        }
    }

    #[test]
    fn ring_non_bidirectional_is_directed() {
        let nodes = ids(3);
        let mut rng = Rng::from_scenario_seed(1);
        let adj = build_topology(&TopologySpec::Ring { bidirectional: false }, &nodes, |_| None, &mut rng).unwrap();
        assert_eq!(adj[&nodes[0]], vec![nodes[1]]);
        assert_eq!(adj[&nodes[1]], vec![nodes[2]]);
        assert_eq!(adj[&nodes[2]], vec![nodes[0]]);
    }

    #[test]
    fn ring_bidirectional_connects_both_directions() {
        let nodes = ids(3);
        let mut rng = Rng::from_scenario_seed(1);
        let adj = build_topology(&TopologySpec::Ring { bidirectional: true }, &nodes, |_| None, &mut rng).unwrap();
        assert!(adj[&nodes[0]].contains(&nodes[1]));
        assert!(adj[&nodes[1]].contains(&nodes[0]));
    }

    #[test]
    fn star_hub_reaches_every_spoke_and_back() {
        let nodes = ids(4);
        let hub = nodes[0];
        let mut rng = Rng::from_scenario_seed(1);
        let resolve = |alias: &str| -> Option<NodeId> {
            if alias == "hub" {
                Some(hub)
            } else {
                None
            }
        };
        let adj = build_topology(&TopologySpec::Star { hub: "hub".into() }, &nodes, resolve, &mut rng).unwrap();
        assert_eq!(adj[&hub].len(), 3);
        for &spoke in &nodes[1..] {
            assert_eq!(adj[&spoke], vec![hub]);
        }
    }

    #[test]
    fn unknown_star_hub_alias_errors() {
        let nodes = ids(2);
        let mut rng = Rng::from_scenario_seed(1);
        let err = build_topology(&TopologySpec::Star { hub: "ghost".into() }, &nodes, |_| None, &mut rng);
        assert!(err.is_err());
    }

    #[test]
    fn custom_connections_resolve_aliases() {
        let nodes = ids(2);
        let mut rng = Rng::from_scenario_seed(1);
        let resolve = |alias: &str| -> Option<NodeId> {
            match alias {
                "a" => Some(nodes[0]),
                "b" => Some(nodes[1]),
                _ => None,
            }
        };
        let adj = build_topology(
            &TopologySpec::Custom {
                connections: vec![("a".into(), "b".into())],
            },
            &nodes,
            resolve,
            &mut rng,
        )
        .unwrap();
        assert_eq!(adj[&nodes[0]], vec![nodes[1]]);
        assert!(adj[&nodes[1]].is_empty());
    }
}
