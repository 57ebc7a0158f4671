//! Replicated state shape
//!
//! A hub's state is a flat mapping from identifier to an arbitrary JSON
//! value. `Value::clone` is a deep copy, so a cloned map shares nothing
//! mutable with its source.

use serde_json::{Map, Value};

use crate::{HubError, HubResult};

/// Identifier -> value mapping held by every hub
pub type State = Map<String, Value>;

/// Check that an identifier can be stored
#[inline]
pub fn validate_id(id: &str) -> HubResult<()> {
    if id.is_empty() {
        return Err(HubError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}

/// Check that a value is set
#[inline]
pub fn validate_value(id: &str, value: &Value) -> HubResult<()> {
    if value.is_null() {
        return Err(HubError::InvalidValue { id: id.to_string() });
    }
    Ok(())
}

/// Check every entry of a whole-state replacement
pub fn validate_state(state: &State) -> HubResult<()> {
    for (id, value) in state {
        validate_id(id)?;
        validate_value(id, value)?;
    }
    Ok(())
}

/// Convert a dynamically shaped value into a state mapping.
///
/// Only objects are accepted; arrays and scalars are rejected with
/// [`HubError::InvalidStateShape`] naming what was found instead.
pub fn state_from_value(value: Value) -> HubResult<State> {
    match value {
        Value::Object(map) => {
            validate_state(&map)?;
            Ok(map)
        }
        other => Err(HubError::InvalidStateShape(value_kind(&other))),
    }
}

/// Short name of a value's JSON type
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_from_object() {
        let state = state_from_value(json!({"a": {"x": 1}, "b": "two"})).unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state["a"], json!({"x": 1}));
    }

    #[test]
    fn test_state_rejects_non_mappings() {
        assert_eq!(
            state_from_value(json!([])),
            Err(HubError::InvalidStateShape("array"))
        );
        assert_eq!(
            state_from_value(json!("")),
            Err(HubError::InvalidStateShape("string"))
        );
        assert_eq!(
            state_from_value(json!(1)),
            Err(HubError::InvalidStateShape("number"))
        );
        assert_eq!(
            state_from_value(Value::Null),
            Err(HubError::InvalidStateShape("null"))
        );
    }

    #[test]
    fn test_state_rejects_bad_entries() {
        assert_eq!(
            state_from_value(json!({"": 1})),
            Err(HubError::InvalidIdentifier(String::new()))
        );
        assert_eq!(
            state_from_value(json!({"k": null})),
            Err(HubError::InvalidValue { id: "k".to_string() })
        );
    }

    #[test]
    fn test_falsy_values_are_set() {
        // Only null counts as "not set"
        for value in [json!(0), json!(false), json!(""), json!([]), json!({})] {
            assert!(validate_value("k", &value).is_ok());
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn entry_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            ".{0,8}".prop_map(Value::from),
            prop::collection::vec(any::<i32>(), 0..4).prop_map(Value::from),
        ]
    }

    proptest! {
        /// Objects with non-empty keys and non-null values pass through unchanged
        #[test]
        fn valid_objects_round_trip(
            entries in prop::collection::btree_map(".{1,8}", entry_value(), 0..8)
        ) {
            let state: State = entries.into_iter().collect();
            let parsed = state_from_value(Value::Object(state.clone()));
            prop_assert_eq!(parsed, Ok(state));
        }

        /// Anything but an object is rejected with its kind
        #[test]
        fn non_objects_rejected(value in entry_value()) {
            let kind = value_kind(&value);
            prop_assert_eq!(state_from_value(value), Err(HubError::InvalidStateShape(kind)));
        }

        /// A single null entry rejects the whole mapping
        #[test]
        fn null_entry_rejects(
            entries in prop::collection::btree_map("[a-z]{1,6}", entry_value(), 0..6),
            bad in "[A-Z]{1,6}"
        ) {
            let mut state: State = entries.into_iter().collect();
            state.insert(bad.clone(), Value::Null);
            prop_assert_eq!(
                state_from_value(Value::Object(state)),
                Err(HubError::InvalidValue { id: bad })
            );
        }
    }
}
