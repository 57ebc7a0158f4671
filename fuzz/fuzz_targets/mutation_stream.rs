//! Fuzz target for arbitrary mutation streams over a three-hub chain.
//!
//! Failed mutations must leave every hub untouched, successful ones must
//! reach every hub.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use puddle_hub::{Hub, Mutation, State};
use serde_json::{json, Value};

#[derive(Arbitrary, Debug)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<u8>),
}

impl FuzzValue {
    fn into_json(self) -> Value {
        match self {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => json!(b),
            FuzzValue::Int(n) => json!(n),
            FuzzValue::Text(s) => json!(s),
            FuzzValue::List(items) => json!(items),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Create(u8, String, FuzzValue),
    Update(u8, String, FuzzValue),
    Remove(u8, String),
    Reset(u8, Vec<(String, FuzzValue)>),
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let hubs: Vec<Hub> = (0..3).map(|_| Hub::new()).collect();
    hubs[1].connect(&hubs[0]).unwrap();
    hubs[2].connect(&hubs[1]).unwrap();

    for op in ops.into_iter().take(64) {
        let (at, mutation) = match op {
            FuzzOp::Create(h, id, v) => (h, Mutation::create(id, v.into_json())),
            FuzzOp::Update(h, id, v) => (h, Mutation::update(id, v.into_json())),
            FuzzOp::Remove(h, id) => (h, Mutation::remove(id)),
            FuzzOp::Reset(h, entries) => {
                let state: State = entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect();
                (h, Mutation::reset(state))
            }
        };
        let hub = &hubs[at as usize % hubs.len()];
        let before = hub.state();

        if hub.apply(mutation, None).is_err() {
            assert_eq!(hub.state(), before);
        }

        let reference = hubs[0].state();
        for other in &hubs[1..] {
            assert_eq!(other.state(), reference);
        }
        for other in &hubs {
            assert_eq!(other.stats().remote_rejected, 0);
        }
    }
});
