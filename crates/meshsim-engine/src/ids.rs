//! # meshsim-engine::ids
//!
//! Generators for the monotonic identifiers the engine hands out at
//! runtime: the event-queue insertion sequence, timer identifiers, and message
//! identifiers. Kept as one small generator rather than scattering counters
//! across `EventScheduler`/`NetworkPlane`/`NodeRegistry`.

use meshsim_types::id::{InsertionSequence, MessageId, TimerId};

#[derive(Debug, Default)]
pub struct IdGen {
    insertion_seq: InsertionSequence,
    msg_id: MessageId,
    timer_id: TimerId,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_insertion_seq(&mut self) -> InsertionSequence {
        let id = self.insertion_seq;
        self.insertion_seq = self.insertion_seq.checked_add(1).expect("insertion sequence overflow");
        id
    }

    pub fn next_msg_id(&mut self) -> MessageId {
        let id = self.msg_id;
        self.msg_id = self.msg_id.checked_add(1).expect("message id overflow");
        id
    }

    pub fn next_timer_id(&mut self) -> TimerId {
        let id = self.timer_id;
        self.timer_id = self.timer_id.checked_add(1).expect("timer id overflow");
        id
    }
}
