//! # meshsim-engine::telemetry
//!
//! Builds point-in-time `Snapshot`s from a `World` and ships them to
//! whatever is watching a running simulation (the TUI, a file exporter)
//! over a non-blocking `crossbeam_channel`. The Driver owns the one
//! `TelemetryBus` for a run and calls `send_snapshot` whenever the
//! configured metrics interval elapses.

use crossbeam_channel::{Receiver, Sender};
use meshsim_types::id::NodeId;
use meshsim_types::metrics_model::{LinkSnapshot, NodeSnapshot, Snapshot};
use meshsim_types::time::SimTime;

use crate::world::World;

/// Builds one `Snapshot` from the world's current state. Cheap enough to
/// call every tick if needed, but the Driver only calls it on the
/// scenario's `metrics.interval_s` boundary to keep channel traffic light.
pub fn build(world: &World, now: SimTime) -> Snapshot {
    let mut nodes: Vec<NodeSnapshot> = world
        .registry
        .iter()
        .map(|(&id, node)| NodeSnapshot {
            id,
            alias: node.alias().to_string(),
            running: node.running,
            partition_id: node.partition_id,
            messages_sent: node.metrics.messages_sent,
            messages_received: node.metrics.messages_received,
            bytes_sent: node.metrics.bytes_sent,
            bytes_received: node.metrics.bytes_received,
        })
        .collect();
    nodes.sort_by_key(|n| n.id);

    let mut links: Vec<LinkSnapshot> = world
        .link_state
        .active_links()
        .map(|(key, stats)| LinkSnapshot::from_key_and_stats(key, stats))
        .collect();
    links.sort_by_key(|l| (l.from, l.to));

    Snapshot { sim_time: now, nodes, links }
}

/// The channel pair a Driver sends snapshots over and a TUI/exporter reads
/// them from. `send_snapshot` never blocks the simulation loop: a full
/// channel (an unresponsive or absent consumer) just drops the sample.
pub struct TelemetryBus {
    tx: Sender<Snapshot>,
}

impl TelemetryBus {
    /// Returns the bus plus the receiving end a consumer hooks up to.
    pub fn channel(capacity: usize) -> (Self, Receiver<Snapshot>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    pub fn send_snapshot(&self, snapshot: Snapshot) {
        let _ = self.tx.try_send(snapshot);
    }
}

/// Convenience wrapper bundling a `World` reference's snapshot with the
/// node id that originated a log line, used by `tracing` span fields so a
/// filtered log view can be grouped per node without custom visitors.
pub fn node_span(id: NodeId) -> tracing::Span {
    tracing::info_span!("node", node_id = id.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashMap;

    #[test]
    fn build_returns_empty_snapshot_for_empty_world() {
        let world = World::new(10, 1, FxHashMap::default());
        let snap = build(&world, 0);
        assert!(snap.nodes.is_empty());
        assert!(snap.links.is_empty());
        assert_eq!(snap.sim_time, 0);
    }
}
