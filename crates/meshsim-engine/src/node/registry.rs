//! # meshsim-engine::node::registry
//!
//! `NodeRegistry`: owns every `VirtualNode` by `NodeId`.
//!
//! Nodes need to call back into structures they are themselves owned by,
//! which a shared-pointer or raw-pointer self reference would normally
//! solve unsafely. The replacement here is a safe arena-plus-index
//! pattern: a node being ticked or handed a callback is `take`n out of
//! the map for the duration of that call, so
//! the borrow checker sees the world's other fields (clock, rng, net,
//! link state, the registry itself for peer lookups) and the one node
//! being driven as two disjoint borrows, then `put_back` once the call
//! returns. No `unsafe` anywhere.

use fxhash::FxHashMap;
use meshsim_proto::{Firmware, FloodMesh, MeshProtocol};
use meshsim_types::id::NodeId;
use meshsim_types::node_config::NodeConfig;

use crate::errors::EngineError;
use crate::node::runtime::VirtualNode;

pub struct NodeRegistry {
    nodes: FxHashMap<NodeId, VirtualNode>,
    alias_to_id: FxHashMap<String, NodeId>,
    next_id: u32,
    cap: usize,
}

impl NodeRegistry {
    pub fn new(cap: usize) -> Self {
        Self {
            nodes: FxHashMap::default(),
            alias_to_id: FxHashMap::default(),
            next_id: 1,
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Allocates a fresh `NodeId` and inserts a new, not-yet-started
    /// `VirtualNode`. `mesh` defaults to `FloodMesh` when the scenario
    /// doesn't name a routing layer explicitly.
    pub fn create(
        &mut self,
        config: NodeConfig,
        firmware: Box<dyn Firmware>,
        mesh: Option<Box<dyn MeshProtocol>>,
    ) -> Result<NodeId, EngineError> {
        if self.nodes.len() + 1 > self.cap {
            return Err(EngineError::CapExceeded {
                current: self.nodes.len(),
                requested: 1,
                cap: self.cap,
            });
        }
        if self.alias_to_id.contains_key(&config.alias) {
            return Err(EngineError::DuplicateId(config.alias.clone()));
        }
        let id = NodeId::new(self.next_id).expect("next_id starts at 1 and only increases");
        self.next_id = self.next_id.checked_add(1).expect("node id space exhausted");

        let alias = config.alias.clone();
        let mesh = mesh.unwrap_or_else(|| Box::new(FloodMesh::default()));
        let node = VirtualNode::new(id, config, firmware, mesh);
        self.nodes.insert(id, node);
        self.alias_to_id.insert(alias, id);
        Ok(id)
    }

    /// Removes a node permanently. Its id
    /// is never reused.
    pub fn remove(&mut self, id: NodeId) -> Option<VirtualNode> {
        let removed = self.nodes.remove(&id);
        if let Some(node) = &removed {
            self.alias_to_id.remove(node.alias());
        }
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&VirtualNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut VirtualNode> {
        self.nodes.get_mut(&id)
    }

    pub fn resolve_alias(&self, alias: &str) -> Option<NodeId> {
        self.alias_to_id.get(alias).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn running_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|(_, n)| n.running).map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &VirtualNode)> {
        self.nodes.iter()
    }

    /// Pulls a node out of the arena for the duration of a callback.
    /// Panics if `id` is unknown — callers only ever take an id they just
    /// confirmed exists.
    pub fn take(&mut self, id: NodeId) -> VirtualNode {
        self.nodes.remove(&id).expect("take() called with an id not present in the registry")
    }

    pub fn put_back(&mut self, node: VirtualNode) {
        self.nodes.insert(node.id(), node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsim_types::node_config::MeshGroupConfig;

    struct NoopFirmware;
    impl Firmware for NoopFirmware {
        fn name(&self) -> &'static str {
            "noop"
        }
        fn setup(&mut self, _ctx: &mut meshsim_proto::FirmwareCtx<'_>) {}
        fn tick(&mut self, _ctx: &mut meshsim_proto::FirmwareCtx<'_>) {}
        fn on_receive(&mut self, _ctx: &mut meshsim_proto::FirmwareCtx<'_>, _from: NodeId, _payload: &[u8]) {}
    }

    fn config(alias: &str) -> NodeConfig {
        NodeConfig {
            alias: alias.into(),
            mesh_group: MeshGroupConfig::default(),
            firmware: None,
            firmware_params: Default::default(),
            partition_id: 0,
        }
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let mut reg = NodeRegistry::new(10);
        let a = reg.create(config("a"), Box::new(NoopFirmware), None).unwrap();
        let b = reg.create(config("b"), Box::new(NoopFirmware), None).unwrap();
        assert_eq!(b.get(), a.get() + 1);
        reg.remove(a);
        let c = reg.create(config("c"), Box::new(NoopFirmware), None).unwrap();
        assert_eq!(c.get(), b.get() + 1);
    }

    #[test]
    fn duplicate_alias_rejected() {
        let mut reg = NodeRegistry::new(10);
        reg.create(config("dup"), Box::new(NoopFirmware), None).unwrap();
        let err = reg.create(config("dup"), Box::new(NoopFirmware), None);
        assert!(matches!(err, Err(EngineError::DuplicateId(_))));
    }

    #[test]
    fn cap_exceeded_rejects_spawn() {
        let mut reg = NodeRegistry::new(1);
        reg.create(config("a"), Box::new(NoopFirmware), None).unwrap();
        let err = reg.create(config("b"), Box::new(NoopFirmware), None);
        assert!(matches!(err, Err(EngineError::CapExceeded { .. })));
    }

    #[test]
    fn take_then_put_back_round_trips() {
        let mut reg = NodeRegistry::new(10);
        let id = reg.create(config("a"), Box::new(NoopFirmware), None).unwrap();
        let node = reg.take(id);
        assert!(!reg.contains(id));
        reg.put_back(node);
        assert!(reg.contains(id));
    }
}
