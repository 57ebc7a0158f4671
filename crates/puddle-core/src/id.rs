//! Identity types for the hub mesh
//!
//! Node identifiers are 64-bit random values: unique enough for any
//! practical mesh and cheap to copy into every event.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hub identity, used to tag emitted events and peer subscriptions
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const ZERO: NodeId = NodeId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    /// Generate a fresh random identity. Never returns [`NodeId::ZERO`].
    pub fn generate() -> Self {
        loop {
            let id: u64 = rand::random();
            if id != 0 {
                return NodeId(id);
            }
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:016x})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identity of one logical mutation, stable across every hop it travels.
///
/// `origin` is the hub where the mutation entered the mesh and `seq` is that
/// hub's local emission counter (starting at 1).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EventId {
    pub origin: NodeId,
    pub seq: u64,
}

impl EventId {
    #[inline]
    pub fn new(origin: NodeId, seq: u64) -> Self {
        EventId { origin, seq }
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:016x}:{})", self.origin.0, self.seq)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.seq)
    }
}
