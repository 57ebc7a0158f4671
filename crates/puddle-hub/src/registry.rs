//! Listener registry and the suppression rule

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use puddle_core::{Event, EventKind, NodeId};
use tracing::trace;

/// Listener callback
pub type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// One registered listener.
///
/// `source` is `None` for external subscribers and the peer's id for
/// callbacks installed by `connect`.
#[derive(Clone)]
pub struct Subscription {
    pub source: Option<NodeId>,
    callback: Callback,
}

impl Subscription {
    pub fn new(source: Option<NodeId>, callback: Callback) -> Self {
        Subscription { source, callback }
    }

    /// Suppressed when it belongs to the edge the event must not return to
    #[inline]
    pub fn is_suppressed(&self, ignore: NodeId) -> bool {
        self.source == Some(ignore)
    }

    #[inline]
    pub fn invoke(&self, event: &Event) {
        (self.callback)(event)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Listeners selected for one emission
#[derive(Debug, Default)]
pub struct Delivery {
    /// Listeners to invoke, in registration order
    pub targets: Vec<Subscription>,
    /// Listeners skipped by the suppression rule
    pub suppressed: usize,
}

/// Event kind -> ordered listeners
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<EventKind, Vec<Subscription>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        ListenerRegistry::default()
    }

    pub fn register(&mut self, kind: EventKind, source: Option<NodeId>, callback: Callback) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Subscription::new(source, callback));
    }

    /// Snapshot of the listeners that should see an event of `kind`
    /// emitted with `ignore`
    pub fn select(&self, kind: EventKind, ignore: NodeId) -> Delivery {
        let mut delivery = Delivery::default();
        for sub in self.listeners.get(&kind).into_iter().flatten() {
            if sub.is_suppressed(ignore) {
                trace!(event = %kind, peer = %ignore, "listener suppressed");
                delivery.suppressed += 1;
            } else {
                delivery.targets.push(sub.clone());
            }
        }
        delivery
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Number of listeners registered by a given peer
    pub fn count_from(&self, source: NodeId) -> usize {
        self.listeners
            .values()
            .flatten()
            .filter(|s| s.source == Some(source))
            .count()
    }
}
