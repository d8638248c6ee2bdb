//! Fuzz target: `wire::decode_relay_state`
//!
//! Feeds arbitrary response bodies to the relay-state decoder and checks
//! that it never panics and that any accepted body re-encodes to a document
//! that decodes to the same state.
//!
//! cargo fuzz run fuzz_relay_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartmeter::app::wire::{decode_relay_state, encode_relay_state};

fuzz_target!(|data: &[u8]| {
    if let Ok(state) = decode_relay_state(data) {
        let body = encode_relay_state(state).expect("relay document fits its buffer");
        assert_eq!(decode_relay_state(&body), Ok(state));
    }
});
