//! # meshsim-types::envelope
//!
//! The opaque payload carried between nodes, and the pending-delivery
//! record the network plane heaps up while a packet is in flight.

use bytes::Bytes;

use crate::id::{MessageId, NodeId};
use crate::time::SimTime;

/// A mesh message's body. Firmware and protocol implementations produce and
/// consume raw bytes; the core never interprets them.
pub type Payload = Bytes;

/// A packet admitted onto the network but not yet delivered. Stored in the
/// `NetworkPlane`'s min-heap, keyed by `(deliver_at, insertion_sequence)`
/// so packets scheduled for the same millisecond still deliver in enqueue
/// order.
#[derive(Clone, Debug)]
pub struct PendingDelivery {
    pub source: NodeId,
    pub destination: NodeId,
    pub payload: Payload,
    pub deliver_at: SimTime,
    pub insertion_sequence: u64,
    pub msg_id: MessageId,
}

impl PartialEq for PendingDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.deliver_at == other.deliver_at && self.insertion_sequence == other.insertion_sequence
    }
}
impl Eq for PendingDelivery {}

impl PartialOrd for PendingDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingDelivery {
    /// Reversed so a `BinaryHeap<PendingDelivery>` is a min-heap on
    /// `(deliver_at, insertion_sequence)`.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .deliver_at
            .cmp(&self.deliver_at)
            .then_with(|| other.insertion_sequence.cmp(&self.insertion_sequence))
    }
}
