//! Fuzz target for seeding hubs from arbitrary JSON.
//!
//! Any input either fails with a typed error or yields a hub whose state
//! holds no null values and no empty identifiers.

#![no_main]

use libfuzzer_sys::fuzz_target;
use puddle_hub::Hub;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok(hub) = Hub::from_value(value.clone()) {
        let state = hub.state();
        assert!(state.keys().all(|k| !k.is_empty()));
        assert!(state.values().all(|v| !v.is_null()));
        assert_eq!(serde_json::Value::Object(state), value);

        assert!(hub.reset_value(value).is_ok());
    }
});
