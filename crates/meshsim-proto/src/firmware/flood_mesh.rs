//! # meshsim-proto::firmware::flood_mesh
//!
//! The default mesh-routing layer: naive flood routing. Every node that
//! receives a packet not already seen relays it to all its peers once, and
//! hands it up to firmware only when this node is the addressed
//! destination. This is deliberately the simplest possible multi-hop
//! routing policy; `FloodMesh` exists so scenarios have something to
//! actually route through without depending on a specific mesh protocol
//! implementation.

use std::collections::HashSet;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use meshsim_types::id::NodeId;

use crate::api::MeshProtocol;
use crate::ctx_ext::FirmwareCtx;

/// Wire framing for a flooded packet: a 4-byte destination node id, a
/// 4-byte origin node id, and the application payload.
fn encode(dst: NodeId, origin: NodeId, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(8 + payload.len());
    buf.put_u32(dst.get());
    buf.put_u32(origin.get());
    buf.put_slice(payload);
    buf.freeze()
}

fn decode(mut bytes: &[u8]) -> Option<(NodeId, NodeId, &[u8])> {
    if bytes.len() < 8 {
        return None;
    }
    let dst = NodeId::new(bytes.get_u32())?;
    let origin = NodeId::new(bytes.get_u32())?;
    Some((dst, origin, bytes))
}

#[derive(Default)]
pub struct FloodMesh {
    /// Messages already relayed, so a flood doesn't loop forever. Bounded
    /// by simply forgetting the oldest entries past a cap, since this is
    /// routing-layer bookkeeping, not a durable record.
    seen: HashSet<u64>,
    seen_order: std::collections::VecDeque<u64>,
}

const SEEN_CAP: usize = 4096;

impl FloodMesh {
    fn mark_seen(&mut self, fingerprint: u64) -> bool {
        if !self.seen.insert(fingerprint) {
            return false;
        }
        self.seen_order.push_back(fingerprint);
        if self.seen_order.len() > SEEN_CAP {
            if let Some(oldest) = self.seen_order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }
}

fn fingerprint(origin: NodeId, payload: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = fxhash::FxHasher::default();
    origin.get().hash(&mut hasher);
    payload.hash(&mut hasher);
    hasher.finish()
}

impl MeshProtocol for FloodMesh {
    fn name(&self) -> &'static str {
        "flood_mesh"
    }

    fn init(&mut self, _ctx: &mut FirmwareCtx<'_>) {}

    fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, packet: &[u8]) -> Option<Bytes> {
        let Some((dst, origin, payload)) = decode(packet) else {
            return None;
        };
        if !self.mark_seen(fingerprint(origin, payload)) {
            return None;
        }
        if dst == ctx.node_id() {
            return Some(Bytes::copy_from_slice(payload));
        }
        for peer in ctx.peers() {
            if peer != from {
                ctx.send(peer, encode(dst, origin, payload));
            }
        }
        None
    }
}

/// Application-facing helper: originates a flooded send addressed to `dst`.
pub fn originate(ctx: &mut FirmwareCtx<'_>, dst: NodeId, payload: &[u8]) {
    let origin = ctx.node_id();
    for peer in ctx.peers() {
        ctx.send(peer, encode(dst, origin, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let dst = NodeId::new(7).unwrap();
        let origin = NodeId::new(3).unwrap();
        let payload = b"hello mesh";
        let wire = encode(dst, origin, payload);
        let (d, o, p) = decode(&wire).unwrap();
        assert_eq!(d, dst);
        assert_eq!(o, origin);
        assert_eq!(p, payload);
    }
}
