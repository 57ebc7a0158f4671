//! Error types for hub operations
//!
//! Every failure is a precondition violation detected before the store is
//! touched, so an error always means "nothing changed".

use thiserror::Error;

use crate::NodeId;

/// Hub errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("Invalid identifier {0:?}: must be a non-empty string")]
    InvalidIdentifier(String),

    #[error("Duplicate identifier {id:?} on node {node}")]
    DuplicateIdentifier { id: String, node: NodeId },

    #[error("Missing identifier {id:?} on node {node}")]
    MissingIdentifier { id: String, node: NodeId },

    #[error("Invalid value for {id:?}: value must be set")]
    InvalidValue { id: String },

    #[error("Invalid state shape: expected a key-value mapping, got {0}")]
    InvalidStateShape(&'static str),

    #[error("Unknown event: {0:?}")]
    UnknownEvent(String),

    #[error("Node {0} cannot connect to itself")]
    SelfConnection(NodeId),
}

impl HubError {
    /// Identifier the failed operation was about, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            HubError::InvalidIdentifier(id)
            | HubError::DuplicateIdentifier { id, .. }
            | HubError::MissingIdentifier { id, .. }
            | HubError::InvalidValue { id } => Some(id),
            HubError::InvalidStateShape(_)
            | HubError::UnknownEvent(_)
            | HubError::SelfConnection(_) => None,
        }
    }
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;
