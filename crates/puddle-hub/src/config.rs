//! Hub configuration

use serde::{Deserialize, Serialize};

/// Hub configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Drop events this hub has already applied or emitted.
    ///
    /// Off by default: plain echo suppression only stops A <-> B ping-pong,
    /// and a cycle of three or more hubs recurses until the stack runs out.
    pub loop_guard: bool,
}

impl HubConfig {
    /// Loop guard on, for meshes that may contain cycles
    pub fn guarded() -> Self {
        HubConfig { loop_guard: true }
    }
}

/// Hub runtime counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStats {
    /// Mutations committed to this hub's store (local and propagated)
    pub mutations: u64,
    pub events_emitted: u64,
    /// Listener invocations
    pub deliveries: u64,
    /// Listeners skipped by echo suppression
    pub suppressed: u64,
    /// Propagated mutations applied here
    pub remote_applied: u64,
    /// Propagated mutations that failed a precondition here
    pub remote_rejected: u64,
    /// Propagated events dropped by the loop guard
    pub duplicates_dropped: u64,
}
