//! Relay state synchronisation with the server.
//!
//! Two directions, two components:
//!
//! - [`RelayStateNotifier`] pushes the local state after a local change
//!   (IR remote, button, boot).  Only `200 OK` counts as accepted.
//! - [`RelayCommandPoller`] fetches the server's desired state and
//!   reconciles it against the local copy, reporting which relays differ.

use core::fmt;

use crate::config::{ConfigError, NetConfig};
use crate::error::SyncError;

use super::events::SyncEvent;
use super::link::LinkStatus;
use super::ports::{EventSink, HttpRequest, HttpTransport};
use super::wire::{self, Url};

const HTTP_OK: u16 = 200;

// ───────────────────────────────────────────────────────────────
// Relay state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayId {
    Relay1,
    Relay2,
}

impl RelayId {
    pub const ALL: [Self; 2] = [Self::Relay1, Self::Relay2];
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relay1 => write!(f, "Relay 1"),
            Self::Relay2 => write!(f, "Relay 2"),
        }
    }
}

/// Commanded on/off state of both relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RelayState {
    pub relay1: bool,
    pub relay2: bool,
}

impl RelayState {
    pub const fn new(relay1: bool, relay2: bool) -> Self {
        Self { relay1, relay2 }
    }

    pub fn get(self, relay: RelayId) -> bool {
        match relay {
            RelayId::Relay1 => self.relay1,
            RelayId::Relay2 => self.relay2,
        }
    }

    pub fn set(&mut self, relay: RelayId, on: bool) {
        match relay {
            RelayId::Relay1 => self.relay1 = on,
            RelayId::Relay2 => self.relay2 = on,
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |b: bool| if b { "ON" } else { "OFF" };
        write!(f, "R1={}, R2={}", on_off(self.relay1), on_off(self.relay2))
    }
}

/// Outcome of a poll: the state the caller should now hold, and whether it
/// differs from what the caller passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPoll {
    pub state: RelayState,
    pub changed: bool,
}

impl RelayPoll {
    /// The caller keeps `state` as-is.
    pub const fn unchanged(state: RelayState) -> Self {
        Self {
            state,
            changed: false,
        }
    }
}

/// Take the server's value for every relay where it differs from `local`,
/// emitting one [`SyncEvent::RemoteRelayCommand`] per differing relay.
pub fn reconcile(local: RelayState, remote: RelayState, sink: &mut impl EventSink) -> RelayPoll {
    let mut state = local;
    let mut changed = false;
    for relay in RelayId::ALL {
        let on = remote.get(relay);
        if on != local.get(relay) {
            state.set(relay, on);
            sink.emit(&SyncEvent::RemoteRelayCommand { relay, on }.into());
            changed = true;
        }
    }
    RelayPoll { state, changed }
}

// ───────────────────────────────────────────────────────────────
// Notifier (device → server)
// ───────────────────────────────────────────────────────────────

/// POSTs local relay state to `{base}/api/relay/state`.
#[derive(Debug, Clone)]
pub struct RelayStateNotifier {
    url: Url,
    timeout_ms: u32,
}

impl RelayStateNotifier {
    pub fn new(config: &NetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: wire::join_url(&config.server_url, wire::RELAY_STATE_PATH)?,
            timeout_ms: config.http_timeout_ms,
        })
    }

    /// Push `state`.  Failures are reported and discarded, never queued.
    pub fn notify(
        &self,
        link: &impl LinkStatus,
        http: &mut impl HttpTransport,
        sink: &mut impl EventSink,
        state: RelayState,
    ) -> Result<(), SyncError> {
        if !link.is_connected() {
            return Err(SyncError::NotConnected);
        }
        let result = self.push(http, state);
        let event = match result {
            Ok(()) => SyncEvent::RelayStatePushed(state),
            Err(e) => SyncEvent::RelayPushFailed(e),
        };
        sink.emit(&event.into());
        result
    }

    fn push(&self, http: &mut impl HttpTransport, state: RelayState) -> Result<(), SyncError> {
        let body = wire::encode_relay_state(state)?;
        let response = http.execute(&HttpRequest::post_json(&self.url, &body, self.timeout_ms))?;
        match response.status {
            HTTP_OK => Ok(()),
            other => Err(SyncError::UnexpectedStatus(other)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Poller (server → device)
// ───────────────────────────────────────────────────────────────

/// GETs the desired relay state from `{base}/api/relay/state`.
#[derive(Debug, Clone)]
pub struct RelayCommandPoller {
    url: Url,
    timeout_ms: u32,
}

impl RelayCommandPoller {
    pub fn new(config: &NetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: wire::join_url(&config.server_url, wire::RELAY_STATE_PATH)?,
            timeout_ms: config.poll_timeout_ms,
        })
    }

    /// Fetch the server's state and reconcile it against `current`.
    ///
    /// `changed` is `false` after a successful round trip when the server
    /// already agrees with `current`; callers re-actuate only on `true`.
    pub fn poll(
        &self,
        link: &impl LinkStatus,
        http: &mut impl HttpTransport,
        sink: &mut impl EventSink,
        current: RelayState,
    ) -> Result<RelayPoll, SyncError> {
        if !link.is_connected() {
            return Err(SyncError::NotConnected);
        }
        match self.fetch(http) {
            Ok(remote) => Ok(reconcile(current, remote, sink)),
            Err(e) => {
                sink.emit(&SyncEvent::RelayPollFailed(e).into());
                Err(e)
            }
        }
    }

    fn fetch(&self, http: &mut impl HttpTransport) -> Result<RelayState, SyncError> {
        let response = http.execute(&HttpRequest::get(&self.url, self.timeout_ms))?;
        if response.status != HTTP_OK {
            return Err(SyncError::UnexpectedStatus(response.status));
        }
        if response.truncated {
            return Err(SyncError::MalformedPayload);
        }
        wire::decode_relay_state(&response.body)
    }
}
