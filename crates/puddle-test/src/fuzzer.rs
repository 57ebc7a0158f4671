//! Mutation Fuzzer - Randomized mutation streams over a hub mesh
//!
//! Checks:
//! - Convergence after every hub has seen every mutation
//! - No hub delivers the same logical event twice
//! - Events from one origin arrive in sequence order
//! - Propagated mutations never fail a precondition on a peer

use puddle_core::{HubResult, Mutation, State};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::debug;

use crate::{ConvergenceResult, EventRecorder, Mesh, MeshBuilder, Topology};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of hubs
    pub hub_count: usize,
    /// Size of the identifier space
    pub key_count: usize,
    /// Number of mutations to apply
    pub op_count: usize,
    pub topology: Topology,
    /// Probability that a step is a full reset (0.0 - 1.0)
    pub reset_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            hub_count: 5,
            key_count: 10,
            op_count: 500,
            topology: Topology::Tree { fanout: 2 },
            reset_prob: 0.02,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            hub_count: 3,
            key_count: 5,
            op_count: 100,
            topology: Topology::Chain,
            reset_prob: 0.0,
            seed: 42,
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            hub_count: 12,
            key_count: 40,
            op_count: 5000,
            topology: Topology::Ring,
            reset_prob: 0.05,
            seed: 42,
        }
    }
}

/// Mutation fuzzer
pub struct MutationFuzzer {
    config: FuzzerConfig,
    mesh: Mesh,
    recorders: Vec<EventRecorder>,
    keys: Vec<String>,
    rng: StdRng,
}

impl MutationFuzzer {
    /// Build the mesh and attach a recorder to every hub
    pub fn new(config: FuzzerConfig) -> HubResult<Self> {
        let mesh = MeshBuilder::new()
            .with_hubs(config.hub_count)
            .with_topology(config.topology)
            .build()?;
        let recorders = mesh.hubs().iter().map(EventRecorder::attach).collect();
        let keys = (0..config.key_count).map(|i| format!("key-{i}")).collect();
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(MutationFuzzer {
            config,
            mesh,
            recorders,
            keys,
            rng,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Recorded events of hub `index`
    pub fn recorder(&self, index: usize) -> &EventRecorder {
        &self.recorders[index]
    }

    fn random_value(&mut self) -> Value {
        match self.rng.gen_range(0..4) {
            0 => json!(self.rng.gen_range(-1000i64..1000)),
            1 => json!(format!("v{}", self.rng.gen::<u16>())),
            2 => json!(self.rng.gen::<bool>()),
            _ => json!({
                "n": self.rng.gen_range(0u32..100),
                "tags": (0..self.rng.gen_range(0..3)).map(|i| i * 2).collect::<Vec<u32>>(),
            }),
        }
    }

    fn random_state(&mut self) -> State {
        let mut state = State::new();
        for i in 0..self.keys.len() {
            if self.rng.gen_bool(0.3) {
                let value = self.random_value();
                state.insert(self.keys[i].clone(), value);
            }
        }
        state
    }

    /// Pick a mutation whose preconditions hold on hub `index`
    fn generate_mutation(&mut self, index: usize) -> Mutation {
        if self.rng.gen::<f64>() < self.config.reset_prob {
            return Mutation::reset(self.random_state());
        }

        let key = self.keys[self.rng.gen_range(0..self.keys.len())].clone();
        if !self.mesh.hub(index).contains(&key) {
            return Mutation::create(key, self.random_value());
        }
        if self.rng.gen_bool(0.7) {
            Mutation::update(key, self.random_value())
        } else {
            Mutation::remove(key)
        }
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> HubResult<FuzzResult> {
        if self.mesh.is_empty() || self.keys.is_empty() {
            return Ok(FuzzResult::new());
        }

        let mut result = FuzzResult::new();
        for _ in 0..self.config.op_count {
            let index = self.rng.gen_range(0..self.mesh.len());
            let mutation = self.generate_mutation(index);
            self.mesh.hub(index).apply(mutation, None)?;
            result.ops_applied += 1;
        }

        self.check_invariants(&mut result);
        debug!(
            seed = self.config.seed,
            ops = result.ops_applied,
            converged = result.convergence.is_converged(),
            "fuzz run finished"
        );
        Ok(result)
    }

    fn check_invariants(&self, result: &mut FuzzResult) {
        result.convergence = self.mesh.check_convergence();

        for (hub, recorder) in self.mesh.hubs().iter().zip(&self.recorders) {
            let events = recorder.events();
            result.events_recorded += events.len() as u64;
            if !properties::each_event_once(&events) {
                result.duplicate_deliveries += 1;
            }
            if !properties::origin_order_preserved(&events) {
                result.ordering_violations += 1;
            }

            let stats = hub.stats();
            result.remote_rejected += stats.remote_rejected;
            result.duplicates_dropped += stats.duplicates_dropped;
        }
    }
}

/// Fuzzing result
#[derive(Debug)]
pub struct FuzzResult {
    pub convergence: ConvergenceResult,
    pub ops_applied: u64,
    /// Events seen by external listeners, summed over hubs
    pub events_recorded: u64,
    /// Hubs that delivered some event more than once
    pub duplicate_deliveries: u32,
    /// Hubs that saw an origin's events out of order
    pub ordering_violations: u32,
    pub remote_rejected: u64,
    pub duplicates_dropped: u64,
}

impl FuzzResult {
    pub fn new() -> Self {
        FuzzResult {
            convergence: ConvergenceResult::Converged,
            ops_applied: 0,
            events_recorded: 0,
            duplicate_deliveries: 0,
            ordering_violations: 0,
            remote_rejected: 0,
            duplicates_dropped: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.convergence.is_converged()
            && self.duplicate_deliveries == 0
            && self.ordering_violations == 0
            && self.remote_rejected == 0
    }
}

impl Default for FuzzResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Property helpers over recorded event logs
pub mod properties {
    use puddle_core::{Event, EventId, NodeId};
    use std::collections::{HashMap, HashSet};

    /// Property: a hub delivers each logical event at most once
    pub fn each_event_once(events: &[Event]) -> bool {
        let mut seen: HashSet<EventId> = HashSet::new();
        events.iter().all(|e| seen.insert(e.id))
    }

    /// Property: events from the same origin arrive in sequence order
    pub fn origin_order_preserved(events: &[Event]) -> bool {
        let mut last_seq: HashMap<NodeId, u64> = HashMap::new();

        for event in events {
            if let Some(&prev) = last_seq.get(&event.id.origin) {
                if event.id.seq <= prev {
                    return false;
                }
            }
            last_seq.insert(event.id.origin, event.id.seq);
        }

        true
    }

    /// Property: every delivered event was emitted by the recording hub
    pub fn emitted_by(events: &[Event], hub: NodeId) -> bool {
        events.iter().all(|e| e.source == hub)
    }
}
