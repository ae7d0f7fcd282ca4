//! # meshsim-proto::firmware::bridge
//!
//! A bridge node exposes connectivity outside the mesh and elects one of
//! {primary, secondary, standby} among the bridges that can currently hear
//! each other, so exactly one bridge is forwarding at a time and a second
//! one is ready to take over. Role election runs off a periodic heartbeat
//! rather than the mesh topology directly, since topology adjacency is
//! static while liveness is not.

use std::collections::HashMap;

use meshsim_types::id::{NodeId, TimerId};
use meshsim_types::time::SimTime;

use crate::api::Firmware;
use crate::ctx_ext::FirmwareCtx;

const HEARTBEAT_PERIOD_MS: u64 = 500;
const ELECTION_TIMEOUT_MS: u64 = 1_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
    Standby,
}

pub struct Bridge {
    id: Option<NodeId>,
    role: Role,
    heartbeat_timer: Option<TimerId>,
    /// Other bridges heard from recently, and when. Entries older than
    /// `ELECTION_TIMEOUT_MS` are treated as gone before every re-election.
    last_heard: HashMap<NodeId, SimTime>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self {
            id: None,
            role: Role::Standby,
            heartbeat_timer: None,
            last_heard: HashMap::new(),
        }
    }
}

impl Bridge {
    pub fn role(&self) -> Role {
        self.role
    }

    fn reelect(&mut self, ctx: &mut FirmwareCtx<'_>) {
        let now = ctx.now();
        self.last_heard.retain(|_, &mut heard_at| now.saturating_sub(heard_at) <= ELECTION_TIMEOUT_MS);

        let Some(self_id) = self.id else { return };
        let mut candidates: Vec<NodeId> = self.last_heard.keys().copied().collect();
        candidates.push(self_id);
        candidates.sort();

        self.role = match candidates.iter().position(|&id| id == self_id) {
            Some(0) => Role::Primary,
            Some(1) => Role::Secondary,
            _ => Role::Standby,
        };
        ctx.log_kv("bridge_role", role_name(self.role));
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Primary => "primary",
        Role::Secondary => "secondary",
        Role::Standby => "standby",
    }
}

/// Wire format: a single tag byte (always `0x01`, heartbeat) followed by
/// the sender's 4-byte big-endian `NodeId`. There is only one message kind
/// today; the tag byte is kept so a future message type doesn't need a
/// breaking format change.
fn encode_heartbeat(id: NodeId) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5);
    buf.push(0x01);
    buf.extend_from_slice(&id.get().to_be_bytes());
    buf
}

fn decode_heartbeat(payload: &[u8]) -> Option<NodeId> {
    if payload.len() != 5 || payload[0] != 0x01 {
        return None;
    }
    let raw = u32::from_be_bytes(payload[1..5].try_into().ok()?);
    NodeId::new(raw)
}

impl Firmware for Bridge {
    fn name(&self) -> &'static str {
        "bridge"
    }

    fn setup(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.id = Some(ctx.node_id());
        self.last_heard.clear();
        self.heartbeat_timer = Some(ctx.set_timer(HEARTBEAT_PERIOD_MS));
        ctx.log_kv("bridge_role", role_name(self.role));
    }

    fn teardown(&mut self, ctx: &mut FirmwareCtx<'_>) {
        if let Some(timer) = self.heartbeat_timer.take() {
            ctx.cancel_timer(timer);
        }
    }

    fn tick(&mut self, ctx: &mut FirmwareCtx<'_>) {
        let due = ctx.due_timers();
        if self.heartbeat_timer.map(|t| due.contains(&t)).unwrap_or(false) {
            if let Some(id) = self.id {
                ctx.broadcast(encode_heartbeat(id), None);
            }
            self.heartbeat_timer = Some(ctx.set_timer(HEARTBEAT_PERIOD_MS));
        }
        self.reelect(ctx);
    }

    fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, payload: &[u8]) {
        if decode_heartbeat(payload).is_some() {
            let now = ctx.now();
            self.last_heard.insert(from, now);
        }
    }

    fn on_dropped_connection(&mut self, _ctx: &mut FirmwareCtx<'_>, peer: NodeId) {
        self.last_heard.remove(&peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_round_trips() {
        let id = NodeId::new(42).unwrap();
        let encoded = encode_heartbeat(id);
        assert_eq!(decode_heartbeat(&encoded), Some(id));
    }

    #[test]
    fn malformed_payload_is_not_a_heartbeat() {
        assert_eq!(decode_heartbeat(&[0x02, 0, 0, 0, 1]), None);
        assert_eq!(decode_heartbeat(&[0x01, 0, 0, 1]), None);
    }

    #[test]
    fn lone_bridge_elects_itself_primary() {
        let mut bridge = Bridge::default();
        bridge.id = Some(NodeId::new(1).unwrap());
        // No peers heard from: candidates == [self], so self is always
        // index 0 -- exercised indirectly through reelect() in full tests
        // that have a FirmwareCtx; here we just check the default role.
        assert_eq!(bridge.role(), Role::Standby);
    }
}
