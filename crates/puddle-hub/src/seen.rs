//! Seen-event tracking for loop-guarded hubs
//!
//! Each origin hub numbers its events 1, 2, 3, ... Re-entrant listeners mean
//! a later number can reach a peer before an earlier one, so every origin
//! keeps the exact set of numbers seen, stored as merged inclusive runs.

use std::collections::{BTreeMap, HashMap};

use puddle_core::{EventId, NodeId};

/// Sequence numbers seen from one origin
#[derive(Clone, Debug, Default)]
pub struct SeenSequence {
    /// Run start -> run end (inclusive); runs never touch or overlap
    runs: BTreeMap<u64, u64>,
}

impl SeenSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `seq` has not been seen yet
    pub fn check(&self, seq: u64) -> bool {
        self.runs
            .range(..=seq)
            .next_back()
            .map_or(true, |(_, &end)| seq > end)
    }

    /// Mark `seq` as seen. Returns false if it already was.
    pub fn accept(&mut self, seq: u64) -> bool {
        if !self.check(seq) {
            return false;
        }

        let mut start = seq;
        let mut end = seq;

        // Join the run ending just below
        if let Some((&prev_start, &prev_end)) = self.runs.range(..seq).next_back() {
            if prev_end.checked_add(1) == Some(seq) {
                start = prev_start;
                self.runs.remove(&prev_start);
            }
        }
        // Join the run starting just above
        if let Some(next) = seq.checked_add(1) {
            if let Some(next_end) = self.runs.remove(&next) {
                end = next_end;
            }
        }

        self.runs.insert(start, end);
        true
    }

    /// Number of disjoint runs; more than one means a gap is still open
    pub fn runs(&self) -> usize {
        self.runs.len()
    }
}

/// Seen sequences for every origin this hub has heard from
#[derive(Debug, Default)]
pub struct SeenEvents {
    origins: HashMap<NodeId, SeenSequence>,
}

impl SeenEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event; false means it is a repeat
    pub fn accept(&mut self, id: EventId) -> bool {
        self.origins.entry(id.origin).or_default().accept(id.seq)
    }

    /// Number of origins tracked
    pub fn origins(&self) -> usize {
        self.origins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_basic() {
        let mut s = SeenSequence::new();
        assert!(s.accept(1));
        assert!(s.accept(2));
        assert!(!s.accept(1));
        assert!(!s.accept(2));
        assert!(s.accept(3));
        assert_eq!(s.runs(), 1);
    }

    #[test]
    fn test_sequence_out_of_order() {
        let mut s = SeenSequence::new();
        assert!(s.accept(5));
        assert!(s.accept(3));
        assert_eq!(s.runs(), 2);
        assert!(s.accept(4));
        assert_eq!(s.runs(), 1);
        assert!(!s.accept(3));
        assert!(!s.accept(5));
    }

    #[test]
    fn test_old_numbers_are_not_forgotten() {
        let mut s = SeenSequence::new();
        assert!(s.accept(1));
        for seq in 3..=200 {
            assert!(s.accept(seq));
        }
        // 2 is far behind the newest number but was never seen
        assert!(s.check(2));
        assert!(s.accept(2));
        assert!(!s.accept(2));
        assert_eq!(s.runs(), 1);
    }

    #[test]
    fn test_large_jump() {
        let mut s = SeenSequence::new();
        assert!(s.accept(1));
        assert!(s.accept(1_000));
        assert!(!s.accept(1_000));
        assert!(s.accept(999));
        assert!(s.check(500));
        assert!(s.accept(u64::MAX));
        assert!(!s.accept(u64::MAX));
    }

    #[test]
    fn test_events_per_origin() {
        let mut seen = SeenEvents::new();
        let a = NodeId::new(1);
        let b = NodeId::new(2);

        assert!(seen.accept(EventId::new(a, 1)));
        assert!(seen.accept(EventId::new(b, 1)));
        assert!(!seen.accept(EventId::new(a, 1)));
        assert!(seen.accept(EventId::new(a, 2)));
        assert_eq!(seen.origins(), 2);
    }
}
