//! Server wire format: endpoint paths and JSON payloads.
//!
//! | Endpoint                | Method | Body                                  |
//! |-------------------------|--------|---------------------------------------|
//! | `/api/data`             | POST   | 8 numeric measurement fields          |
//! | `/api/relay/state`      | POST   | `{"relay1": bool, "relay2": bool}`    |
//! | `/api/relay/state`      | GET    | response `{"relay1": .., "relay2": ..}`|

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::SyncError;

use super::relay::RelayState;
use super::telemetry::TelemetrySnapshot;

pub const TELEMETRY_PATH: &str = "/api/data";
pub const RELAY_STATE_PATH: &str = "/api/relay/state";

/// Encoded telemetry document capacity.
pub const TELEMETRY_BODY_CAPACITY: usize = 512;
/// Encoded relay document capacity.
pub const RELAY_BODY_CAPACITY: usize = 128;

/// Base URL (max 128) plus the longest endpoint path.
pub const MAX_URL_LEN: usize = 160;

pub type Url = heapless::String<MAX_URL_LEN>;
pub type TelemetryBody = heapless::Vec<u8, TELEMETRY_BODY_CAPACITY>;
pub type RelayBody = heapless::Vec<u8, RELAY_BODY_CAPACITY>;

#[derive(Serialize)]
struct TelemetryPayload {
    voltage: f32,
    current1: f32,
    current2: f32,
    current3: f32,
    total_current: f32,
    power1: f32,
    power2: f32,
    total_power: f32,
}

impl From<&TelemetrySnapshot> for TelemetryPayload {
    fn from(s: &TelemetrySnapshot) -> Self {
        Self {
            voltage: s.voltage,
            current1: s.current1,
            current2: s.current2,
            current3: s.current3,
            total_current: s.total_current,
            power1: s.power1,
            power2: s.power2,
            total_power: s.total_power,
        }
    }
}

/// Absent keys read as `false`; any present key must be a JSON boolean.
#[derive(Serialize, Deserialize)]
struct RelayPayload {
    #[serde(default)]
    relay1: bool,
    #[serde(default)]
    relay2: bool,
}

/// Join the configured base URL and an endpoint path.
pub fn join_url(base: &str, path: &str) -> Result<Url, ConfigError> {
    let mut url = Url::new();
    write!(url, "{base}{path}").map_err(|_| ConfigError::InvalidServerUrl)?;
    Ok(url)
}

fn encode<const N: usize, T: Serialize>(value: &T) -> Result<heapless::Vec<u8, N>, SyncError> {
    let bytes = serde_json::to_vec(value).map_err(|_| SyncError::MalformedPayload)?;
    heapless::Vec::from_slice(&bytes).map_err(|()| SyncError::PayloadTooLarge)
}

/// Serialize a measurement snapshot.  Non-finite readings encode as `null`.
pub fn encode_telemetry(snapshot: &TelemetrySnapshot) -> Result<TelemetryBody, SyncError> {
    encode(&TelemetryPayload::from(snapshot))
}

pub fn encode_relay_state(state: RelayState) -> Result<RelayBody, SyncError> {
    encode(&RelayPayload {
        relay1: state.relay1,
        relay2: state.relay2,
    })
}

/// Parse a relay-state document returned by the server.
pub fn decode_relay_state(body: &[u8]) -> Result<RelayState, SyncError> {
    // serde would also accept `[bool, bool]` for a struct; only objects are valid.
    if body.iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'{') {
        return Err(SyncError::MalformedPayload);
    }
    let payload: RelayPayload =
        serde_json::from_slice(body).map_err(|_| SyncError::MalformedPayload)?;
    Ok(RelayState::new(payload.relay1, payload.relay2))
}
