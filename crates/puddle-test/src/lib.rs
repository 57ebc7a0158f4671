//! Puddle Test Harness - Mesh scenarios and protocol validation
//!
//! This crate provides:
//! - Mesh builders for chain, star, tree and ring topologies
//! - Event recording on any hub
//! - Seeded mutation fuzzing with convergence checks
//! - Logging setup for tests

pub mod fuzzer;
pub mod logging;
pub mod mesh;
pub mod recorder;

pub use fuzzer::*;
pub use logging::*;
pub use mesh::*;
pub use recorder::*;
