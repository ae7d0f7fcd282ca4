//! # meshsim-proto::firmware::counter
//!
//! A small periodic-broadcast firmware: every node announces an
//! incrementing counter to a fixed neighbor set on a timer, and tallies
//! what it has received from each peer. Exercises timers, broadcast, and
//! `on_new_connection`/`on_dropped_connection` together.

use std::collections::HashMap;

use meshsim_types::id::{NodeId, TimerId};

use crate::api::Firmware;
use crate::ctx_ext::FirmwareCtx;

const TICK_PERIOD_MS: u64 = 1_000;

pub struct Counter {
    id: Option<NodeId>,
    local_count: u64,
    timer: Option<TimerId>,
    received: HashMap<NodeId, u64>,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            id: None,
            local_count: 0,
            timer: None,
            received: HashMap::new(),
        }
    }
}

impl Firmware for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn setup(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.id = Some(ctx.node_id());
        self.timer = Some(ctx.set_timer(TICK_PERIOD_MS));
        ctx.log_kv("role", "counter");
    }

    fn teardown(&mut self, ctx: &mut FirmwareCtx<'_>) {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_timer(timer);
        }
    }

    fn tick(&mut self, ctx: &mut FirmwareCtx<'_>) {
        if let Some(timer) = self.timer {
            if ctx.due_timers().contains(&timer) {
                self.on_timer_fired(ctx);
            }
        }
    }

    fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, payload: &[u8]) {
        if let Ok(bytes) = payload.try_into() {
            let value = u64::from_be_bytes(bytes);
            self.received.insert(from, value);
            ctx.log_kv("peers_heard_from", &self.received.len().to_string());
        }
    }

    fn on_new_connection(&mut self, ctx: &mut FirmwareCtx<'_>, peer: NodeId) {
        tracing::debug!(node_id = ctx.node_id().get(), peer = peer.get(), "new connection");
    }

    fn on_dropped_connection(&mut self, ctx: &mut FirmwareCtx<'_>, peer: NodeId) {
        self.received.remove(&peer);
        tracing::debug!(node_id = ctx.node_id().get(), peer = peer.get(), "connection dropped");
    }
}

impl Counter {
    /// Invoked from `tick` once `ctx.due_timers()` reports this firmware's
    /// timer has fired; not part of `Firmware` itself, since there is no
    /// generic `on_timer` capability in that trait.
    fn on_timer_fired(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.local_count += 1;
        let payload = self.local_count.to_be_bytes().to_vec();
        ctx.broadcast(payload, None);
        self.timer = Some(ctx.set_timer(TICK_PERIOD_MS));
    }
}
