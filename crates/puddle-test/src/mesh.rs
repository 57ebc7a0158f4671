//! Mesh builder for multi-hub scenarios

use std::collections::BTreeSet;

use puddle_core::{HubResult, State};
use puddle_hub::{Hub, HubConfig};
use tracing::debug;

/// Shape of the connection graph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// `0 - 1 - 2 - ...`, each hub joins the previous one
    Chain,
    /// Every hub joins hub 0
    Star,
    /// Breadth-first filled tree with at most `fanout` children per hub
    Tree { fanout: usize },
    /// Chain closed back onto hub 0
    Ring,
}

impl Topology {
    /// Rings contain a cycle; everything else is a tree
    pub fn has_cycle(self) -> bool {
        matches!(self, Topology::Ring)
    }

    /// Edges as `(joining hub, existing hub)` pairs, in connection order
    pub fn edges(self, size: usize) -> Vec<(usize, usize)> {
        match self {
            Topology::Chain => (1..size).map(|i| (i, i - 1)).collect(),
            Topology::Star => (1..size).map(|i| (i, 0)).collect(),
            Topology::Tree { fanout } => {
                let fanout = fanout.max(1);
                (1..size).map(|i| (i, (i - 1) / fanout)).collect()
            }
            Topology::Ring => {
                let mut edges = Topology::Chain.edges(size);
                if size > 2 {
                    edges.push((0, size - 1));
                }
                edges
            }
        }
    }
}

/// Result of comparing every hub's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    Converged,
    /// Keys whose presence or value differs somewhere
    Diverged(Vec<String>),
}

impl ConvergenceResult {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }
}

/// A set of connected hubs
#[derive(Debug)]
pub struct Mesh {
    hubs: Vec<Hub>,
    edges: Vec<(usize, usize)>,
    topology: Topology,
}

impl Mesh {
    pub fn hub(&self, index: usize) -> &Hub {
        &self.hubs[index]
    }

    pub fn hubs(&self) -> &[Hub] {
        &self.hubs
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Compare every hub against hub 0
    pub fn check_convergence(&self) -> ConvergenceResult {
        let Some((first, rest)) = self.hubs.split_first() else {
            return ConvergenceResult::Converged;
        };
        let reference = first.state();
        let mut divergent = BTreeSet::new();

        for hub in rest {
            let state = hub.state();
            for (key, value) in &reference {
                if state.get(key) != Some(value) {
                    divergent.insert(key.clone());
                }
            }
            for key in state.keys() {
                if !reference.contains_key(key) {
                    divergent.insert(key.clone());
                }
            }
        }

        if divergent.is_empty() {
            ConvergenceResult::Converged
        } else {
            ConvergenceResult::Diverged(divergent.into_iter().collect())
        }
    }
}

/// Mesh builder
pub struct MeshBuilder {
    size: usize,
    topology: Topology,
    config: HubConfig,
    root_state: Option<State>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        MeshBuilder {
            size: 3,
            topology: Topology::Chain,
            config: HubConfig::default(),
            root_state: None,
        }
    }

    pub fn with_hubs(mut self, count: usize) -> Self {
        self.size = count;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed hub 0 before any connection is made
    pub fn with_root_state(mut self, state: State) -> Self {
        self.root_state = Some(state);
        self
    }

    /// Build and connect the hubs.
    ///
    /// Ring meshes always get the loop guard; without it the closing
    /// `connect` would recurse forever.
    pub fn build(self) -> HubResult<Mesh> {
        let mut config = self.config;
        if self.topology.has_cycle() {
            config.loop_guard = true;
        }

        let mut root_state = self.root_state;
        let mut hubs = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            let hub = Hub::with_config(config.clone());
            let hub = match root_state.take() {
                Some(state) => hub.with_initial_state(state)?,
                None => hub,
            };
            hubs.push(hub);
        }

        let edges = self.topology.edges(self.size);
        for &(joining, existing) in &edges {
            hubs[joining].connect(&hubs[existing])?;
        }
        debug!(hubs = hubs.len(), edges = edges.len(), topology = ?self.topology, "mesh built");

        Ok(Mesh {
            hubs,
            edges,
            topology: self.topology,
        })
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topology_edges() {
        assert_eq!(Topology::Chain.edges(3), vec![(1, 0), (2, 1)]);
        assert_eq!(Topology::Star.edges(3), vec![(1, 0), (2, 0)]);
        assert_eq!(
            Topology::Tree { fanout: 2 }.edges(6),
            vec![(1, 0), (2, 0), (3, 1), (4, 1), (5, 2)]
        );
        assert_eq!(Topology::Ring.edges(3), vec![(1, 0), (2, 1), (0, 2)]);
        assert_eq!(Topology::Ring.edges(2), vec![(1, 0)]);
    }

    #[test]
    fn test_root_state_reaches_every_hub() {
        let mut seed = State::new();
        seed.insert("k".to_string(), json!({"from": "root"}));

        for topology in [
            Topology::Chain,
            Topology::Star,
            Topology::Tree { fanout: 2 },
            Topology::Ring,
        ] {
            let mesh = MeshBuilder::new()
                .with_hubs(6)
                .with_topology(topology)
                .with_root_state(seed.clone())
                .build()
                .unwrap();
            assert!(mesh.check_convergence().is_converged(), "{topology:?}");
            assert_eq!(mesh.hub(5).state(), seed);
        }
    }

    #[test]
    fn test_ring_is_guarded() {
        let mesh = MeshBuilder::new()
            .with_hubs(4)
            .with_topology(Topology::Ring)
            .build()
            .unwrap();
        assert!(mesh.hubs().iter().all(|h| h.config().loop_guard));

        mesh.hub(1).create("k", json!(1)).unwrap();
        mesh.hub(3).update("k", json!(2)).unwrap();
        assert!(mesh.check_convergence().is_converged());
    }

    #[test]
    fn test_divergence_detected() {
        let mesh = MeshBuilder::new().with_hubs(2).build().unwrap();
        // Write to hub 1 while suppressing its only edge
        mesh.hub(1)
            .apply(
                puddle_core::Mutation::create("only-here", json!(true)),
                Some(mesh.hub(0).node_id()),
            )
            .unwrap();
        assert_eq!(
            mesh.check_convergence(),
            ConvergenceResult::Diverged(vec!["only-here".to_string()])
        );
    }
}
