//! # meshsim-proto::ctx_ext
//!
//! `FirmwareCtx`, the ergonomic wrapper handed to `Firmware` and
//! `MeshProtocol` callbacks. It wraps the engine's `SimCtx` trait object and
//! exposes convenient, non-generic methods — there is no message type to be
//! generic over here, since every payload is already raw bytes.

use bytes::Bytes;
use meshsim_types::id::{NodeId, TimerId};
use meshsim_types::time::SimTime;

use crate::api::SimCtx;

pub struct FirmwareCtx<'a> {
    inner: &'a mut dyn SimCtx,
}

impl<'a> FirmwareCtx<'a> {
    pub fn new(inner: &'a mut dyn SimCtx) -> Self {
        Self { inner }
    }

    /// Fire-and-forget send to a specific destination. The caller has no
    /// visibility into whether the packet is later lost or throttled.
    pub fn send(&mut self, dst: NodeId, payload: impl Into<Bytes>) {
        self.inner.send(dst, payload.into());
    }

    pub fn broadcast(&mut self, payload: impl Into<Bytes>, filter: Option<&dyn Fn(NodeId) -> bool>) {
        self.inner.broadcast(payload.into(), filter);
    }

    pub fn set_timer(&mut self, after: SimTime) -> TimerId {
        self.inner.set_timer(after)
    }

    pub fn cancel_timer(&mut self, timer: TimerId) -> bool {
        self.inner.cancel_timer(timer)
    }

    /// Timers that fired since the last poll. Call once per `tick` and
    /// match returned ids against whatever a firmware is tracking.
    pub fn due_timers(&mut self) -> Vec<TimerId> {
        self.inner.due_timers()
    }

    pub fn now(&self) -> SimTime {
        self.inner.now()
    }

    pub fn node_id(&self) -> NodeId {
        self.inner.node_id()
    }

    /// The node's currently-connected peers, as seen by the mesh layer.
    pub fn peers(&self) -> Vec<NodeId> {
        self.inner.peers()
    }

    /// A deterministic `u64` drawn from the simulation's single RNG stream.
    /// Any randomness a firmware needs (backoff jitter, election timeouts)
    /// must come from here to preserve the determinism invariant.
    pub fn rng_u64(&mut self) -> u64 {
        self.inner.rng_u64()
    }

    /// Attaches a key-value pair to the current tracing span, surfaced in
    /// logs and the TUI's node detail view.
    pub fn log_kv(&mut self, key: &'static str, val: &str) {
        self.inner.log_kv(key, val);
    }
}
