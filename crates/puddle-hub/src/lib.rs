//! Puddle Hub - Replicated key/value hubs with echo-suppressed propagation
//!
//! This crate implements the replication node:
//! - State store with strict precondition checks
//! - Listener registry with per-edge suppression
//! - Peer connection and state bootstrap
//! - Optional seen-event tracking against mesh cycles
//! - Runtime statistics
//!
//! ```
//! use puddle_hub::Hub;
//! use serde_json::json;
//!
//! let one = Hub::new();
//! let two = Hub::new();
//! two.connect(&one).unwrap();
//!
//! one.create("k1", json!({"x": 1})).unwrap();
//! assert_eq!(two.get("k1"), Some(json!({"x": 1})));
//! ```

pub mod config;
pub mod hub;
pub mod registry;
pub mod seen;
pub mod store;

pub use config::*;
pub use hub::*;
pub use registry::*;
pub use seen::*;
pub use store::*;

pub use puddle_core::{Event, EventId, EventKind, HubError, HubResult, Mutation, NodeId, State};
