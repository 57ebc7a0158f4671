//! Event definitions
//!
//! Events are the only thing hubs exchange. Each one carries the mutation
//! that was applied, the hub that emitted it, and the peer edge it must not
//! be sent back along.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EventId, HubError, NodeId, State};

/// Event kind, one per mutating operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Remove,
    Reset,
}

impl EventKind {
    /// Every kind, in wiring order
    pub const ALL: [EventKind; 4] = [
        EventKind::Create,
        EventKind::Remove,
        EventKind::Update,
        EventKind::Reset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Remove => "remove",
            EventKind::Reset => "reset",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(EventKind::Create),
            "update" => Ok(EventKind::Update),
            "remove" => Ok(EventKind::Remove),
            "reset" => Ok(EventKind::Reset),
            other => Err(HubError::UnknownEvent(other.to_string())),
        }
    }
}

/// Mutation operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Mutation {
    /// Insert a new identifier
    Create { id: String, value: Value },
    /// Replace the value of an existing identifier
    Update { id: String, value: Value },
    /// Delete an existing identifier
    Remove { id: String },
    /// Replace the whole state
    Reset { state: State },
}

impl Mutation {
    pub fn create(id: impl Into<String>, value: Value) -> Self {
        Mutation::Create {
            id: id.into(),
            value,
        }
    }

    pub fn update(id: impl Into<String>, value: Value) -> Self {
        Mutation::Update {
            id: id.into(),
            value,
        }
    }

    pub fn remove(id: impl Into<String>) -> Self {
        Mutation::Remove { id: id.into() }
    }

    pub fn reset(state: State) -> Self {
        Mutation::Reset { state }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            Mutation::Create { .. } => EventKind::Create,
            Mutation::Update { .. } => EventKind::Update,
            Mutation::Remove { .. } => EventKind::Remove,
            Mutation::Reset { .. } => EventKind::Reset,
        }
    }

    /// Target identifier; `None` for whole-state resets
    pub fn id(&self) -> Option<&str> {
        match self {
            Mutation::Create { id, .. } | Mutation::Update { id, .. } | Mutation::Remove { id } => {
                Some(id)
            }
            Mutation::Reset { .. } => None,
        }
    }

    /// Value carried by create/update
    pub fn value(&self) -> Option<&Value> {
        match self {
            Mutation::Create { value, .. } | Mutation::Update { value, .. } => Some(value),
            Mutation::Remove { .. } | Mutation::Reset { .. } => None,
        }
    }
}

/// A mutation as delivered to listeners
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Logical event identity, unchanged as the event crosses hubs
    pub id: EventId,
    /// Hub that emitted this hop
    pub source: NodeId,
    /// Peer edge skipped for this hop
    pub ignore: NodeId,
    /// Applied mutation (a copy independent of the emitter's state)
    pub mutation: Mutation,
}

impl Event {
    pub fn new(id: EventId, source: NodeId, ignore: NodeId, mutation: Mutation) -> Self {
        Event {
            id,
            source,
            ignore,
            mutation,
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.mutation.kind()
    }

    /// True when this hop is the one where the mutation entered the mesh
    #[inline]
    pub fn is_origin_hop(&self) -> bool {
        self.id.origin == self.source
    }
}
