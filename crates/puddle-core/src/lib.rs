//! Puddle Core - Fundamental types of the replicated hub store
//!
//! This crate defines the types shared by every hub:
//! - Identifiers (NodeId, EventId)
//! - Mutations and the events that carry them between hubs
//! - State shape and its validation rules
//! - The error taxonomy

pub mod error;
pub mod event;
pub mod id;
pub mod state;

pub use error::*;
pub use event::*;
pub use id::*;
pub use state::*;
