//! Event recording on hubs

use std::sync::Arc;

use parking_lot::Mutex;
use puddle_core::{Event, EventId, EventKind, NodeId};
use puddle_hub::Hub;

/// Collects every event a hub delivers to external listeners.
///
/// Clones share the same log, so a recorder can be moved into several
/// callbacks and still be read from the test body.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every event kind emitted by `hub`
    pub fn attach(hub: &Hub) -> Self {
        Self::attach_kinds(hub, &EventKind::ALL)
    }

    /// Record only the given kinds
    pub fn attach_kinds(hub: &Hub, kinds: &[EventKind]) -> Self {
        let recorder = Self::new();
        for &kind in kinds {
            recorder.listen(hub, kind);
        }
        recorder
    }

    /// Add `hub` to this recorder's log
    pub fn listen(&self, hub: &Hub, kind: EventKind) {
        let events = Arc::clone(&self.events);
        hub.on(kind, move |event| events.lock().push(event.clone()));
    }

    /// Snapshot of the log in delivery order
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(Event::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }

    /// Events that entered the mesh at `origin`
    pub fn from_origin(&self, origin: NodeId) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.id.origin == origin)
            .cloned()
            .collect()
    }

    /// How many times the logical event `id` was delivered
    pub fn deliveries_of(&self, id: EventId) -> usize {
        self.events.lock().iter().filter(|e| e.id == id).count()
    }

    pub fn last(&self) -> Option<Event> {
        self.events.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
