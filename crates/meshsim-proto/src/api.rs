//! # meshsim-proto::api
//!
//! The capability-interface traits firmware and mesh-protocol
//! implementations satisfy, and the engine-facing context trait object they
//! are given to perform side effects through.
//!
//! This favors composition over inheritance: rather than a base class
//! with virtual callbacks, a `Firmware` implementation is just a value
//! satisfying a flat set of methods, and the engine holds it behind
//! `Box<dyn Firmware>`. There is no generic message type to thread through —
//! the payload a node sends or receives is always an opaque byte sequence,
//! so unlike a typed RPC protocol there is nothing here analogous to a
//! serialization adapter.

use bytes::Bytes;
use meshsim_types::id::{NodeId, TimerId};
use meshsim_types::time::SimTime;

use crate::ctx_ext::FirmwareCtx;

/// The engine-provided side of the contract: what a firmware or
/// mesh-protocol instance can ask the simulator to do during a callback.
/// Implemented by the engine's per-tick context; never by protocol code.
pub trait SimCtx {
    fn send(&mut self, dst: NodeId, payload: Bytes);
    fn broadcast(&mut self, payload: Bytes, filter: Option<&dyn Fn(NodeId) -> bool>);
    fn set_timer(&mut self, after: SimTime) -> TimerId;
    fn cancel_timer(&mut self, timer: TimerId) -> bool;
    /// Timer identifiers that have reached their deadline since the last
    /// call, drained on read. There is no `on_timer` capability — a firmware that sets timers polls
    /// this from its own `tick` instead.
    fn due_timers(&mut self) -> Vec<TimerId>;
    fn now(&self) -> SimTime;
    fn node_id(&self) -> NodeId;
    fn peers(&self) -> Vec<NodeId>;
    fn rng_u64(&mut self) -> u64;
    fn log_kv(&mut self, key: &'static str, val: &str);
}

/// The capability interface a firmware unit implements:
/// `{setup, tick, on_receive, on_new_connection, on_changed_connections,
/// on_dropped_connection, on_time_adjusted, name}`.
pub trait Firmware: Send {
    fn name(&self) -> &'static str;

    /// Invoked once when the owning node starts.
    fn setup(&mut self, ctx: &mut FirmwareCtx<'_>);

    /// Invoked once when the owning node stops gracefully. Not called on a
    /// crash.
    fn teardown(&mut self, _ctx: &mut FirmwareCtx<'_>) {}

    /// Invoked once per tick while the node is running.
    fn tick(&mut self, ctx: &mut FirmwareCtx<'_>);

    fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, payload: &[u8]);

    fn on_new_connection(&mut self, _ctx: &mut FirmwareCtx<'_>, _peer: NodeId) {}

    fn on_changed_connections(&mut self, _ctx: &mut FirmwareCtx<'_>) {}

    fn on_dropped_connection(&mut self, _ctx: &mut FirmwareCtx<'_>, _peer: NodeId) {}

    fn on_time_adjusted(&mut self, _ctx: &mut FirmwareCtx<'_>, _offset_ms: i64) {}
}

/// The mesh-routing layer a `VirtualNode` hosts underneath its firmware.
pub trait MeshProtocol: Send {
    fn name(&self) -> &'static str;

    fn init(&mut self, ctx: &mut FirmwareCtx<'_>);

    /// Invoked once per tick, before firmware's own `tick`. Most routing
    /// policies (e.g. `FloodMesh`) are purely reactive and leave this as a
    /// no-op; protocols that need periodic maintenance (route refresh,
    /// keepalives) override it.
    fn tick(&mut self, _ctx: &mut FirmwareCtx<'_>) {}

    /// Handles an inbound packet at the mesh layer. Returns the payload to
    /// hand up to firmware's `on_receive` if this packet was addressed to
    /// this node (as opposed to one this node should only relay).
    fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, payload: &[u8]) -> Option<Bytes>;

    fn on_new_connection(&mut self, _ctx: &mut FirmwareCtx<'_>, _peer: NodeId) {}

    fn on_dropped_connection(&mut self, _ctx: &mut FirmwareCtx<'_>, _peer: NodeId) {}
}

/// A factory closure registered by name, used to build either a `Firmware`
/// or a `MeshProtocol` instance. Registries are explicit values built at
/// startup and passed in — no hidden global singleton.
pub type FirmwareFactory = fn() -> Box<dyn Firmware>;
