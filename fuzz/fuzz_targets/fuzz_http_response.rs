//! Fuzz target: `HttpResponse::new` + relay poll reconciliation
//!
//! Wraps arbitrary bytes as a server response body, then runs them through
//! the same decode-and-reconcile path a relay poll takes.  The body buffer
//! must never exceed its capacity and reconciliation must always adopt the
//! decoded state.
//!
//! cargo fuzz run fuzz_http_response

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartmeter::app::events::AppEvent;
use smartmeter::app::ports::{EventSink, HttpResponse, RESPONSE_BODY_CAPACITY};
use smartmeter::app::relay::{RelayState, reconcile};
use smartmeter::app::wire::decode_relay_state;

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&seed, body)) = data.split_first() else {
        return;
    };
    let response = HttpResponse::new(200, body);
    assert!(response.body.len() <= RESPONSE_BODY_CAPACITY);
    assert_eq!(response.truncated, body.len() > RESPONSE_BODY_CAPACITY);

    let local = RelayState::new(seed & 1 != 0, seed & 2 != 0);
    if let Ok(remote) = decode_relay_state(&response.body) {
        let outcome = reconcile(local, remote, &mut Discard);
        assert_eq!(outcome.state, remote);
        assert_eq!(outcome.changed, local != remote);
    }
});
