//! # meshsim-engine::net
//!
//! The network plane: the gatekeeper every inter-node
//! packet passes through. `send` runs the six-step admission pipeline
//! (existence, partition, hard-drop, bandwidth, loss, latency) and either
//! enqueues a `PendingDelivery` or returns a statistical outcome; the
//! Driver drains whatever has come due each tick via `poll_ready`.

mod bandwidth;
pub mod distribution;
mod link;
mod loss;

use std::collections::BinaryHeap;

use fxhash::FxHashMap;
use meshsim_types::envelope::{Payload, PendingDelivery};
use meshsim_types::id::{LinkKey, NodeId};
use meshsim_types::time::SimTime;

use crate::ids::IdGen;
use crate::node::registry::NodeRegistry;
use crate::rng::Rng;

pub use bandwidth::BandwidthBucket;
pub use distribution::sample_latency;
pub use link::{quality_to_configs, LinkOverrides, LinkState};
pub use loss::LossState;

/// The statistical result of one `NetworkPlane::send` call. None of these are Rust errors — a dropped or throttled packet is
/// an expected wireless outcome the firmware never learns about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SendOutcome {
    Enqueued { deliver_at: SimTime },
    UndeliverableRecipient,
    BlockedByPartition,
    LinkDown,
    Throttled,
    LostInTransit,
}

impl SendOutcome {
    pub fn is_enqueued(&self) -> bool {
        matches!(self, SendOutcome::Enqueued { .. })
    }
}

#[derive(Default)]
pub struct NetworkPlane {
    pending: BinaryHeap<PendingDelivery>,
    loss_states: FxHashMap<LinkKey, LossState>,
    bandwidth_states: FxHashMap<LinkKey, BandwidthBucket>,
}

impl NetworkPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Runs the full admission pipeline for one packet from `from` to
    /// `to`. The caller is responsible for having already established that
    /// `from` itself exists and is running (true by construction for a
    /// send issued from inside that node's own `tick`/callback; explicit
    /// checks belong to call sites like `InjectMessage` that originate a
    /// send outside of any node's own execution).
    #[allow(clippy::too_many_arguments)]
    pub fn send(
        &mut self,
        registry: &NodeRegistry,
        link_state: &mut LinkState,
        rng: &mut Rng,
        ids: &mut IdGen,
        now: SimTime,
        from: NodeId,
        to: NodeId,
        payload: Payload,
    ) -> SendOutcome {
        let key = LinkKey::new(from, to);

        // 1. Existence check.
        let recipient_live = registry.get(to).map(|n| n.running).unwrap_or(false);
        if !recipient_live {
            link_state.stats_mut(key).messages_blocked_unknown += 1;
            return SendOutcome::UndeliverableRecipient;
        }

        // 2. Partition check.
        let from_partition = registry.get(from).map(|n| n.partition_id).unwrap_or(0);
        let to_partition = registry.get(to).map(|n| n.partition_id).unwrap_or(0);
        let connected = from_partition == 0 && to_partition == 0
            || (from_partition != 0 && from_partition == to_partition);
        if !connected {
            link_state.stats_mut(key).messages_blocked_partition += 1;
            return SendOutcome::BlockedByPartition;
        }

        // 3. Hard-drop check. Classified under the same counter family as
        // a partition block: both mean "no
        // connectivity" from the admission layer's point of view.
        if link_state.is_dropped(key) {
            link_state.stats_mut(key).messages_blocked_partition += 1;
            return SendOutcome::LinkDown;
        }

        // 4. Bandwidth check.
        let bandwidth_cfg = link_state.resolve_bandwidth(key);
        if !bandwidth_cfg.is_unlimited() {
            let bucket = self
                .bandwidth_states
                .entry(key)
                .or_insert_with(|| BandwidthBucket::new(&bandwidth_cfg));
            if !bucket.try_debit(now, &bandwidth_cfg, payload.len() as u64) {
                link_state.stats_mut(key).messages_throttled_bandwidth += 1;
                return SendOutcome::Throttled;
            }
        }

        // 5. Loss check.
        let loss_cfg = link_state.resolve_loss(key);
        let loss_state = self.loss_states.entry(key).or_default();
        if loss_state.roll(rng.inner_mut(), &loss_cfg) {
            link_state.stats_mut(key).messages_dropped_loss += 1;
            return SendOutcome::LostInTransit;
        }

        // 6. Latency sample.
        let latency_cfg = link_state.resolve_latency(key);
        let delay = sample_latency(rng.inner_mut(), &latency_cfg);
        let deliver_at = now.saturating_add(delay);
        link_state.stats_mut(key).latency.record(delay);

        // 7. Enqueue.
        let insertion_sequence = ids.next_insertion_seq();
        let msg_id = ids.next_msg_id();
        self.pending.push(PendingDelivery {
            source: from,
            destination: to,
            payload,
            deliver_at,
            insertion_sequence,
            msg_id,
        });
        link_state.stats_mut(key).messages_sent += 1;
        SendOutcome::Enqueued { deliver_at }
    }

    /// Drains every delivery due at or before `now`, in `(deliver_at,
    /// insertion_sequence)` order.
    pub fn poll_ready(&mut self, now: SimTime) -> Vec<PendingDelivery> {
        let mut ready = Vec::new();
        while let Some(top) = self.pending.peek() {
            if top.deliver_at > now {
                break;
            }
            ready.push(self.pending.pop().expect("peeked entry must pop"));
        }
        ready
    }

    /// Drops every still-pending delivery originated by `node` from the
    /// queue. `VirtualNode::stop` calls this; a crash
    /// deliberately does not, since in-flight packets from a crashed node
    /// still simulate traffic already on the wire.
    pub fn retract_from(&mut self, node: NodeId) {
        let kept: Vec<_> = self.pending.drain().filter(|p| p.source != node).collect();
        self.pending = kept.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsim_proto::firmware::echo::Echo;
    use meshsim_proto::FloodMesh;
    use meshsim_types::node_config::{MeshGroupConfig, NodeConfig};

    fn node_config(alias: &str) -> NodeConfig {
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

    /// Builds a registry with `count` already-running nodes and returns
    /// their ids in creation order.
    fn running_registry(count: u32) -> (NodeRegistry, Vec<NodeId>) {
        let mut registry = NodeRegistry::new(1000);
        let mut ids = Vec::new();
        for n in 0..count {
            let id = registry
                .create(
                    node_config(&format!("n{n}")),
                    Box::new(Echo::default()),
                    Some(Box::new(FloodMesh::default())),
                )
                .unwrap();
            registry.get_mut(id).unwrap().force_running_for_test();
            ids.push(id);
        }
        (registry, ids)
    }

    #[test]
    fn scenario_a_two_node_delivery() {
        let (registry, node_ids) = running_registry(2);
        let (node_a, node_b) = (node_ids[0], node_ids[1]);
        let mut link_state = LinkState::new();
        link_state
            .default_latency_set(meshsim_types::config::LatencyConfig {
                min_ms: 10,
                max_ms: 10,
                distribution: meshsim_types::config::LatencyDistribution::Uniform,
            })
            .unwrap();
        let mut rng = Rng::from_scenario_seed(1);
        let mut ids = IdGen::new();
        let mut net = NetworkPlane::new();

        let outcome = net.send(
            &registry,
            &mut link_state,
            &mut rng,
            &mut ids,
            1_000,
            node_a,
            node_b,
            Payload::from_static(b"hi"),
        );
        assert_eq!(outcome, SendOutcome::Enqueued { deliver_at: 1_010 });

        let key = LinkKey::new(node_a, node_b);
        assert_eq!(link_state.stats(key).messages_sent, 1);
        assert!(net.poll_ready(1_009).is_empty());
        let ready = net.poll_ready(1_010);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].destination, node_b);
    }

    #[test]
    fn undeliverable_recipient_increments_blocked_unknown() {
        let (registry, node_ids) = running_registry(1);
        let node_a = node_ids[0];
        let ghost = NodeId::new(node_a.get() + 500).unwrap();
        let mut link_state = LinkState::new();
        let mut rng = Rng::from_scenario_seed(1);
        let mut ids = IdGen::new();
        let mut net = NetworkPlane::new();

        let outcome = net.send(
            &registry,
            &mut link_state,
            &mut rng,
            &mut ids,
            0,
            node_a,
            ghost,
            Payload::from_static(b"x"),
        );
        assert_eq!(outcome, SendOutcome::UndeliverableRecipient);
        let key = LinkKey::new(node_a, ghost);
        assert_eq!(link_state.stats(key).messages_blocked_unknown, 1);
    }

    #[test]
    fn hard_drop_blocks_new_sends_but_not_in_flight() {
        let (registry, node_ids) = running_registry(2);
        let (node_a, node_b) = (node_ids[0], node_ids[1]);
        let mut link_state = LinkState::new();
        let mut rng = Rng::from_scenario_seed(7);
        let mut ids = IdGen::new();
        let mut net = NetworkPlane::new();
        let key = LinkKey::new(node_a, node_b);

        let first = net.send(
            &registry,
            &mut link_state,
            &mut rng,
            &mut ids,
            0,
            node_a,
            node_b,
            Payload::from_static(b"pre-cut"),
        );
        assert!(first.is_enqueued());

        link_state.drop(key);
        let second = net.send(
            &registry,
            &mut link_state,
            &mut rng,
            &mut ids,
            5,
            node_a,
            node_b,
            Payload::from_static(b"post-cut"),
        );
        assert_eq!(second, SendOutcome::LinkDown);

        // The pre-cut packet is still in the queue and still delivers —
        // `poll_ready` never re-checks the drop flag.
        assert_eq!(net.pending_len(), 1);
    }
}
