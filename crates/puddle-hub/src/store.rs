//! State store - the hub's local replica

use serde_json::Value;

use puddle_core::{
    validate_id, validate_state, validate_value, HubError, HubResult, Mutation, NodeId, State,
};

/// Local replica of the shared state.
///
/// All checks run before the map is touched, so a failed call leaves the
/// store exactly as it was.
#[derive(Debug, Default)]
pub struct StateStore {
    /// Owner, reported in precondition errors
    node: NodeId,
    entries: State,
}

impl StateStore {
    pub fn new(node: NodeId) -> Self {
        StateStore {
            node,
            entries: State::new(),
        }
    }

    /// Create a store seeded with `state`
    pub fn with_state(node: NodeId, state: State) -> HubResult<Self> {
        validate_state(&state)?;
        Ok(StateStore {
            node,
            entries: state,
        })
    }

    /// Insert a new identifier. Returns the copy to emit.
    pub fn create(&mut self, id: &str, value: Value) -> HubResult<Value> {
        validate_id(id)?;
        validate_value(id, &value)?;
        if self.entries.contains_key(id) {
            return Err(HubError::DuplicateIdentifier {
                id: id.to_string(),
                node: self.node,
            });
        }
        self.entries.insert(id.to_string(), value.clone());
        Ok(value)
    }

    /// Replace the value of an existing identifier. Returns the copy to emit.
    pub fn update(&mut self, id: &str, value: Value) -> HubResult<Value> {
        validate_id(id)?;
        validate_value(id, &value)?;
        let slot = self
            .entries
            .get_mut(id)
            .ok_or_else(|| HubError::MissingIdentifier {
                id: id.to_string(),
                node: self.node,
            })?;
        *slot = value.clone();
        Ok(value)
    }

    /// Delete an existing identifier, returning its last value
    pub fn remove(&mut self, id: &str) -> HubResult<Value> {
        validate_id(id)?;
        self.entries
            .remove(id)
            .ok_or_else(|| HubError::MissingIdentifier {
                id: id.to_string(),
                node: self.node,
            })
    }

    /// Replace everything. Returns a copy of the new state to emit.
    pub fn reset(&mut self, state: State) -> HubResult<State> {
        validate_state(&state)?;
        self.entries = state;
        Ok(self.entries.clone())
    }

    /// Apply a mutation and return the payload to emit for it
    pub fn apply(&mut self, mutation: Mutation) -> HubResult<Mutation> {
        match mutation {
            Mutation::Create { id, value } => {
                let value = self.create(&id, value)?;
                Ok(Mutation::Create { id, value })
            }
            Mutation::Update { id, value } => {
                let value = self.update(&id, value)?;
                Ok(Mutation::Update { id, value })
            }
            Mutation::Remove { id } => {
                self.remove(&id)?;
                Ok(Mutation::Remove { id })
            }
            Mutation::Reset { state } => {
                let state = self.reset(state)?;
                Ok(Mutation::Reset { state })
            }
        }
    }

    /// Deep copy of the whole state
    pub fn snapshot(&self) -> State {
        self.entries.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
