//! # meshsim-types::id
//!
//! Identifier types used throughout the simulation. `NodeId` is a distinct
//! newtype rather than a bare integer so a node identifier can never be
//! silently used where a timer or event identifier was meant.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A unique, non-zero identifier for a node in the simulation.
///
/// Invariant: zero is never a valid node identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(NodeId)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for NodeId {
    type Error = crate::errors::SimError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        NodeId::new(value).ok_or(crate::errors::SimError::ZeroNodeId)
    }
}

/// An ordered pair identifying a directional link between two nodes.
/// Every impairment in `LinkState` is keyed by this pair, since latency,
/// loss, and bandwidth are all per-direction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct LinkKey {
    pub from: NodeId,
    pub to: NodeId,
}

impl LinkKey {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    pub fn reverse(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// A monotonically increasing identifier for a scheduled event, used only
/// to break ties between events at the same `scheduled_time`.
pub type InsertionSequence = u64;

/// A unique identifier for a timer set by a firmware or protocol instance.
pub type TimerId = u64;

/// A unique, deterministically-assigned identifier for a single message.
pub type MessageId = u64;
