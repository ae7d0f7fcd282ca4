//! # meshsim-engine::node::runtime
//!
//! `VirtualNode`: the per-node runtime state and lifecycle. Holds the node's mesh-protocol and firmware instances behind
//! `Box<dyn _>` and its own timer bookkeeping; never touches the network
//! plane or other nodes directly — all cross-node effects flow out through
//! the `FirmwareCtx`/`SimCtx` the caller hands in.

use fxhash::FxHashMap;
use meshsim_proto::{Firmware, FirmwareCtx, MeshProtocol};
use meshsim_types::id::{NodeId, TimerId};
use meshsim_types::metrics_model::NodeMetrics;
use meshsim_types::node_config::NodeConfig;
use meshsim_types::time::SimTime;

pub struct VirtualNode {
    id: NodeId,
    config: NodeConfig,
    firmware: Box<dyn Firmware>,
    mesh: Box<dyn MeshProtocol>,
    /// Whether this node is currently up. A graceful `stop()` calls
    /// `teardown`; a `crash()` does not.
    pub running: bool,
    pub partition_id: u32,
    pub metrics: NodeMetrics,
    timers: FxHashMap<TimerId, SimTime>,
}

impl VirtualNode {
    pub fn new(id: NodeId, config: NodeConfig, firmware: Box<dyn Firmware>, mesh: Box<dyn MeshProtocol>) -> Self {
        let partition_id = config.partition_id;
        Self {
            id,
            config,
            firmware,
            mesh,
            running: false,
            partition_id,
            metrics: NodeMetrics::default(),
            timers: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn alias(&self) -> &str {
        &self.config.alias
    }

    pub fn firmware_name(&self) -> &'static str {
        self.firmware.name()
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = NodeMetrics::default();
    }

    /// Brings the node up: runs mesh-layer `init` then firmware `setup`.
    /// Called for both a fresh `NodeStart` and a `Restart` following a
    /// clean `stop` or a `crash`.
    pub fn start(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.running = true;
        self.metrics.start_time = ctx.now();
        self.timers.clear();
        self.mesh.init(ctx);
        self.firmware.setup(ctx);
    }

    /// Graceful shutdown: runs `teardown` before going down, so firmware
    /// gets a chance to release timers and log a clean exit.
    pub fn stop(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.firmware.teardown(ctx);
        self.running = false;
        self.timers.clear();
    }

    /// An unclean stop: the node goes down immediately with no `teardown`
    /// call, matching real firmware crashing mid-execution. Any in-flight packets it already sent are unaffected.
    pub fn crash(&mut self) {
        self.running = false;
        self.timers.clear();
    }

    pub fn tick(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.mesh.tick(ctx);
        self.firmware.tick(ctx);
    }

    /// Routes an inbound packet through the mesh layer first; only packets
    /// the mesh layer resolves as addressed to this node (as opposed to
    /// ones it merely relays) reach firmware's own `on_receive`.
    pub fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, payload: &[u8]) {
        self.metrics.messages_received += 1;
        self.metrics.bytes_received += payload.len() as u64;
        if let Some(delivered) = self.mesh.on_receive(ctx, from, payload) {
            self.firmware.on_receive(ctx, from, &delivered);
        }
    }

    pub fn on_new_connection(&mut self, ctx: &mut FirmwareCtx<'_>, peer: NodeId) {
        self.mesh.on_new_connection(ctx, peer);
        self.firmware.on_new_connection(ctx, peer);
    }

    pub fn on_dropped_connection(&mut self, ctx: &mut FirmwareCtx<'_>, peer: NodeId) {
        self.mesh.on_dropped_connection(ctx, peer);
        self.firmware.on_dropped_connection(ctx, peer);
    }

    pub fn on_changed_connections(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.firmware.on_changed_connections(ctx);
    }

    pub fn on_time_adjusted(&mut self, ctx: &mut FirmwareCtx<'_>, offset_ms: i64) {
        self.firmware.on_time_adjusted(ctx, offset_ms);
    }

    pub fn record_send(&mut self, bytes: usize) {
        self.metrics.messages_sent += 1;
        self.metrics.bytes_sent += bytes as u64;
    }

    pub fn arm_timer(&mut self, id: TimerId, deadline: SimTime) {
        self.timers.insert(id, deadline);
    }

    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Removes and returns every timer whose deadline has passed, for the
    /// engine to surface through `SimCtx::due_timers` before a `tick`.
    pub fn poll_due(&mut self, now: SimTime) -> Vec<TimerId> {
        let due: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(&id, _)| id)
            .collect();
        for id in &due {
            self.timers.remove(id);
        }
        due
    }

    #[cfg(test)]
    pub fn force_running_for_test(&mut self) {
        self.running = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsim_proto::FloodMesh;
    use meshsim_types::node_config::MeshGroupConfig;

    struct NoopFirmware;
    impl Firmware for NoopFirmware {
        fn name(&self) -> &'static str {
            "noop"
        }
        fn setup(&mut self, _ctx: &mut FirmwareCtx<'_>) {}
        fn tick(&mut self, _ctx: &mut FirmwareCtx<'_>) {}
        fn on_receive(&mut self, _ctx: &mut FirmwareCtx<'_>, _from: NodeId, _payload: &[u8]) {}
    }

    fn config() -> NodeConfig {
        NodeConfig {
            alias: "n1".into(),
            mesh_group: MeshGroupConfig::default(),
            firmware: None,
            firmware_params: Default::default(),
            partition_id: 0,
        }
    }

    #[test]
    fn timer_due_once_deadline_passes() {
        let id = NodeId::new(1).unwrap();
        let mut node = VirtualNode::new(id, config(), Box::new(NoopFirmware), Box::new(FloodMesh::default()));
        node.arm_timer(7, 100);
        assert!(node.poll_due(99).is_empty());
        let due = node.poll_due(100);
        assert_eq!(due, vec![7]);
        // Consumed: a second poll at the same time finds nothing left.
        assert!(node.poll_due(100).is_empty());
    }

    #[test]
    fn crash_clears_timers_without_teardown() {
        let id = NodeId::new(1).unwrap();
        let mut node = VirtualNode::new(id, config(), Box::new(NoopFirmware), Box::new(FloodMesh::default()));
        node.arm_timer(1, 50);
        node.running = true;
        node.crash();
        assert!(!node.running);
        assert!(node.poll_due(1_000_000).is_empty());
    }
}
