//! Hub - one replica in the propagation mesh
//!
//! A hub owns a [`StateStore`] and a [`ListenerRegistry`]. Every successful
//! mutation is emitted as an [`Event`] to the hub's listeners. `connect`
//! installs each hub's receive path as a listener on the other, tagged with
//! the receiving hub's id, so that an event is never handed back along the
//! edge it arrived on:
//!
//! ```text
//!   one ── two ── three
//!
//!   one.create(k)   emit(ignore = one)  -> two.receive
//!   two             emit(ignore = one)  -> three.receive   (edge to one skipped)
//!   three           emit(ignore = two)  -> (no other edges)
//! ```
//!
//! Delivery is synchronous and re-entrant: one logical mutation crosses the
//! whole mesh inside a single call stack. Suppression only covers the edge
//! an event came in on, so in a cycle of three or more hubs an event keeps
//! circulating until the stack overflows. [`HubConfig::loop_guard`] stops
//! this by dropping events a hub has already seen.
//!
//! No lock is held while a listener runs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use puddle_core::{
    state_from_value, Event, EventId, EventKind, HubError, HubResult, Mutation, NodeId, State,
};

use crate::{HubConfig, HubStats, ListenerRegistry, SeenEvents, StateStore};

struct HubInner {
    node_id: NodeId,
    config: HubConfig,
    store: Mutex<StateStore>,
    listeners: Mutex<ListenerRegistry>,
    /// Peers in connection order
    peers: Mutex<Vec<NodeId>>,
    seen: Mutex<SeenEvents>,
    /// Last local event sequence number
    seq: AtomicU64,
    stats: Mutex<HubStats>,
}

/// Replicated hub handle.
///
/// Cloning is cheap and yields another handle to the same hub. Peer edges
/// hold weak references, so a hub lives exactly as long as some handle to
/// it does.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// Create an empty hub with a generated identity
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create an empty hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        Self::with_identity(NodeId::generate(), config)
    }

    pub fn with_identity(node_id: NodeId, config: HubConfig) -> Self {
        Hub {
            inner: Arc::new(HubInner {
                node_id,
                config,
                store: Mutex::new(StateStore::new(node_id)),
                listeners: Mutex::new(ListenerRegistry::new()),
                peers: Mutex::new(Vec::new()),
                seen: Mutex::new(SeenEvents::new()),
                seq: AtomicU64::new(0),
                stats: Mutex::new(HubStats::default()),
            }),
        }
    }

    /// Create a hub seeded with `state`
    pub fn with_state(state: State) -> HubResult<Self> {
        Hub::new().with_initial_state(state)
    }

    /// Create a hub seeded from a dynamically shaped value.
    ///
    /// Fails with [`HubError::InvalidStateShape`] unless `value` is an object.
    pub fn from_value(value: Value) -> HubResult<Self> {
        Self::with_state(state_from_value(value)?)
    }

    /// Seed the store without emitting anything.
    ///
    /// Meant for freshly built hubs; on a connected hub use [`Hub::reset`].
    pub fn with_initial_state(self, state: State) -> HubResult<Self> {
        let store = StateStore::with_state(self.node_id(), state)?;
        debug!(node = %self.node_id(), entries = store.len(), "seeded");
        *self.inner.store.lock() = store;
        Ok(self)
    }

    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.inner.node_id
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register an external listener. External listeners are never suppressed.
    pub fn on<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(kind, None, callback);
    }

    /// Register a listener by textual event name
    pub fn on_named<F>(&self, name: &str, callback: F) -> HubResult<()>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let kind: EventKind = name.parse()?;
        self.on(kind, callback);
        Ok(())
    }

    /// Register a listener, optionally tagged with the peer edge it serves.
    ///
    /// A listener tagged `Some(peer)` is skipped for every emission whose
    /// `ignore` is `peer`.
    pub fn subscribe<F>(&self, kind: EventKind, source: Option<NodeId>, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        debug!(node = %self.node_id(), event = %kind, source = ?source, "listener bound");
        self.inner
            .listeners
            .lock()
            .register(kind, source, Arc::new(callback));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.listeners.lock().count(kind)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert a new identifier and propagate it
    pub fn create(&self, id: &str, value: Value) -> HubResult<()> {
        self.apply(Mutation::create(id, value), None)
    }

    /// Replace an existing identifier's value and propagate it
    pub fn update(&self, id: &str, value: Value) -> HubResult<()> {
        self.apply(Mutation::update(id, value), None)
    }

    /// Delete an existing identifier and propagate the removal
    pub fn remove(&self, id: &str) -> HubResult<()> {
        self.apply(Mutation::remove(id), None)
    }

    /// Replace the whole state (empty when `None`) and propagate it
    pub fn reset(&self, state: Option<State>) -> HubResult<()> {
        self.apply(Mutation::reset(state.unwrap_or_default()), None)
    }

    /// Reset from a dynamically shaped value; arrays and scalars are rejected
    pub fn reset_value(&self, value: Value) -> HubResult<()> {
        self.reset(Some(state_from_value(value)?))
    }

    /// Apply a mutation locally and emit it.
    ///
    /// `ignore` names the peer edge the event must not be delivered to;
    /// `None` suppresses nothing.
    ///
    /// The result only reflects this hub. A peer that rejects the propagated
    /// mutation logs a warning and bumps [`HubStats::remote_rejected`]; the
    /// failure never reaches the caller.
    pub fn apply(&self, mutation: Mutation, ignore: Option<NodeId>) -> HubResult<()> {
        self.commit(mutation, ignore.unwrap_or(self.node_id()), None)
    }

    /// Store the mutation, then emit it. `event_id` is `None` for mutations
    /// that enter the mesh here.
    fn commit(
        &self,
        mutation: Mutation,
        ignore: NodeId,
        event_id: Option<EventId>,
    ) -> HubResult<()> {
        debug!(
            node = %self.node_id(),
            op = %mutation.kind(),
            id = mutation.id().unwrap_or(""),
            ignore = %ignore,
            "apply"
        );

        let payload = self.inner.store.lock().apply(mutation)?;
        self.inner.stats.lock().mutations += 1;

        let event_id = match event_id {
            Some(id) => id,
            None => {
                let id = self.next_event_id();
                if self.inner.config.loop_guard {
                    self.inner.seen.lock().accept(id);
                }
                id
            }
        };

        self.emit(Event::new(event_id, self.node_id(), ignore, payload));
        Ok(())
    }

    fn next_event_id(&self) -> EventId {
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1;
        EventId::new(self.node_id(), seq)
    }

    /// Deliver an event to every listener not tagged with `event.ignore`
    fn emit(&self, event: Event) {
        let delivery = self
            .inner
            .listeners
            .lock()
            .select(event.kind(), event.ignore);

        debug!(
            node = %self.node_id(),
            event = %event.kind(),
            event_id = %event.id,
            origin_hop = event.is_origin_hop(),
            ignore = %event.ignore,
            listeners = delivery.targets.len(),
            suppressed = delivery.suppressed,
            "emit"
        );

        {
            let mut stats = self.inner.stats.lock();
            stats.events_emitted += 1;
            stats.deliveries += delivery.targets.len() as u64;
            stats.suppressed += delivery.suppressed as u64;
        }

        for sub in &delivery.targets {
            trace!(node = %self.node_id(), event = %event.kind(), listener = ?sub.source, "fire");
            sub.invoke(&event);
        }
    }

    /// Entry point for events arriving over a peer edge
    fn receive(&self, event: &Event) {
        if self.inner.config.loop_guard {
            let mut seen = self.inner.seen.lock();
            if !seen.accept(event.id) {
                trace!(
                    node = %self.node_id(),
                    from = %event.source,
                    event_id = %event.id,
                    origins = seen.origins(),
                    "already seen"
                );
                drop(seen);
                self.inner.stats.lock().duplicates_dropped += 1;
                return;
            }
        }

        match self.commit(event.mutation.clone(), event.source, Some(event.id)) {
            Ok(()) => self.inner.stats.lock().remote_applied += 1,
            Err(err) => {
                warn!(
                    node = %self.node_id(),
                    from = %event.source,
                    event_id = %event.id,
                    id = err.identifier().unwrap_or(""),
                    error = %err,
                    "propagated mutation rejected"
                );
                self.inner.stats.lock().remote_rejected += 1;
            }
        }
    }

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    /// Join `peer`: adopt its state, wire both hubs together, and announce
    /// the adopted state to this hub's other neighbours.
    ///
    /// The peer's state wins at connection time. Afterwards mutations flow
    /// both ways. A mutation that a connected hub rejects is logged and
    /// counted there, never returned to the hub it started on.
    pub fn connect(&self, peer: &Hub) -> HubResult<()> {
        if peer.node_id() == self.node_id() {
            return Err(HubError::SelfConnection(self.node_id()));
        }
        debug!(node = %self.node_id(), peer = %peer.node_id(), "connect");

        let adopted = peer.state();

        for kind in EventKind::ALL {
            peer.forward_to(kind, self);
            self.forward_to(kind, peer);
        }
        self.inner.peers.lock().push(peer.node_id());
        peer.inner.peers.lock().push(self.node_id());
        trace!(
            node = %self.node_id(),
            peer = %peer.node_id(),
            edges = self.inner.listeners.lock().count_from(peer.node_id()),
            "peer wired"
        );

        self.commit(Mutation::reset(adopted), peer.node_id(), None)
    }

    /// Register a listener here that hands `kind` events to `target`,
    /// tagged with `target`'s id
    fn forward_to(&self, kind: EventKind, target: &Hub) {
        let node = self.node_id();
        let target_id = target.node_id();
        let target: Weak<HubInner> = Arc::downgrade(&target.inner);

        self.subscribe(kind, Some(target_id), move |event: &Event| {
            match target.upgrade() {
                Some(inner) => Hub { inner }.receive(event),
                None => trace!(node = %node, peer = %target_id, "peer dropped, event discarded"),
            }
        });
    }

    /// Peers in the order they were connected
    pub fn peers(&self) -> Vec<NodeId> {
        self.inner.peers.lock().clone()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Deep copy of the current state
    pub fn state(&self) -> State {
        trace!(node = %self.node_id(), "state");
        self.inner.store.lock().snapshot()
    }

    /// Copy of one value
    pub fn get(&self, id: &str) -> Option<Value> {
        self.inner.store.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.store.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    pub fn stats(&self) -> HubStats {
        self.inner.stats.lock().clone()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("node_id", &self.node_id())
            .field("entries", &self.len())
            .field("peers", &self.inner.peers.lock().len())
            .finish()
    }
}
