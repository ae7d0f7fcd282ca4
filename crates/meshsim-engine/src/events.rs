//! # meshsim-engine::events
//!
//! The time-ordered scenario event queue. An `Event` is a
//! one-shot scenario action; the `EventScheduler` pops every event whose
//! `scheduled_time <= now` in `(scheduled_time, insertion_sequence)` order —
//! no extra discriminant layer is needed since insertion order alone makes
//! the ordering stable.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use meshsim_types::config::{LatencyConfig, PacketLossConfig};
use meshsim_types::envelope::Payload;
use meshsim_types::id::{InsertionSequence, LinkKey, NodeId};
use meshsim_types::time::SimTime;

use crate::ids::IdGen;

/// A one-shot scenario action, one variant per scheduled event kind.
#[derive(Debug, Clone)]
pub enum Event {
    NodeStart(NodeId),
    NodeStop(NodeId),
    NodeCrash(NodeId),
    NodeRestart(NodeId),
    NodeAdd {
        count: usize,
        template: String,
        id_prefix: String,
    },
    NodeRemove(NodeId),
    ConnectionDrop(NodeId, NodeId),
    ConnectionRestore(NodeId, NodeId),
    ConnectionDegrade {
        a: NodeId,
        b: NodeId,
        latency: Option<LatencyConfig>,
        loss: Option<PacketLossConfig>,
    },
    NetworkPartition {
        groups: Vec<Vec<NodeId>>,
    },
    NetworkHeal,
    InjectMessage {
        from: NodeId,
        /// `None` broadcasts to every node currently running.
        to: Option<NodeId>,
        payload: Payload,
    },
    SetNetworkQuality {
        /// `None` applies the mapping scenario-wide (every default config).
        link: Option<LinkKey>,
        quality: f64,
    },
}

/// An `Event` plus its place in the heap ordering.
#[derive(Debug)]
pub struct Queued {
    pub time: SimTime,
    pub insertion_sequence: InsertionSequence,
    pub event: Event,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.insertion_sequence == other.insertion_sequence
    }
}
impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    /// Reversed so `BinaryHeap<Queued>` behaves as a min-heap on
    /// `(time, insertion_sequence)`.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.insertion_sequence.cmp(&self.insertion_sequence))
    }
}

#[derive(Default)]
pub struct EventScheduler {
    queue: BinaryHeap<Queued>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `event` to the heap for dispatch once `clock.now() >= at`.
    /// `insertion_sequence` is handed out by the shared `IdGen` so ordering
    /// stays consistent with timers and message ids drawn the same tick.
    pub fn schedule(&mut self, at: SimTime, event: Event, ids: &mut IdGen) {
        let insertion_sequence = ids.next_insertion_seq();
        self.queue.push(Queued {
            time: at,
            insertion_sequence,
            event,
        });
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|q| q.time)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pops and returns every event due at or before `now`, in
    /// `(time, insertion_sequence)` order.
    pub fn drain_due(&mut self, now: SimTime) -> Vec<Event> {
        let mut due = Vec::new();
        while let Some(top) = self.queue.peek() {
            if top.time > now {
                break;
            }
            due.push(self.queue.pop().unwrap().event);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nid(n: u32) -> NodeId {
        NodeId::new(n).unwrap()
    }

    #[test]
    fn dispatches_in_time_then_sequence_order() {
        let mut ids = IdGen::new();
        let mut sched = EventScheduler::new();
        sched.schedule(100, Event::NodeStop(nid(2)), &mut ids);
        sched.schedule(50, Event::NodeStart(nid(1)), &mut ids);
        sched.schedule(50, Event::NodeCrash(nid(1)), &mut ids);

        let due = sched.drain_due(50);
        assert_eq!(due.len(), 2);
        assert!(matches!(due[0], Event::NodeStart(_)));
        assert!(matches!(due[1], Event::NodeCrash(_)));
        assert!(sched.peek_time() == Some(100));
    }

    #[test]
    fn does_not_dispatch_future_events() {
        let mut ids = IdGen::new();
        let mut sched = EventScheduler::new();
        sched.schedule(1_000, Event::NetworkHeal, &mut ids);
        assert!(sched.drain_due(500).is_empty());
    }
}
