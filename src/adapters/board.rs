//! Board state mailboxes.
//!
//! The metering front-end and relay drivers live outside this crate.  They
//! hand their readings to [`MeterReadings`] and their switch positions to
//! [`RelayBank`], which the device loop reads through [`MeterPort`] and
//! [`RelayPort`].
//!
//! Local relay changes (button press, IR remote, schedule) are latched until
//! the loop pushes them to the server.  Server commands are applied without
//! latching a change, so they are never echoed back, and are queued for the
//! relay driver to pick up.

use log::debug;

use crate::app::ports::{MeterPort, RelayPort};
use crate::app::relay::{RelayId, RelayState};
use crate::app::telemetry::TelemetrySnapshot;

// ───────────────────────────────────────────────────────────────
// Meter
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MeterReadings {
    latest: Option<TelemetrySnapshot>,
    measurements: u32,
}

impl MeterReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the newest measurement set, replacing the previous one.
    pub fn record(&mut self, snapshot: TelemetrySnapshot) {
        self.latest = Some(snapshot);
        self.measurements = self.measurements.wrapping_add(1);
    }

    pub fn measurements(&self) -> u32 {
        self.measurements
    }
}

impl MeterPort for MeterReadings {
    fn latest_snapshot(&mut self) -> Option<TelemetrySnapshot> {
        self.latest
    }
}

// ───────────────────────────────────────────────────────────────
// Relays
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RelayBank {
    relays: RelayState,
    local_change: bool,
    remote_update: Option<RelayState>,
}

impl RelayBank {
    pub fn new(initial: RelayState) -> Self {
        Self {
            relays: initial,
            ..Self::default()
        }
    }

    /// Report a locally driven relay position.  Only an actual difference
    /// latches a pending change.
    pub fn set_local(&mut self, state: RelayState) {
        if state != self.relays {
            debug!("board: local relays {} -> {}", self.relays, state);
            self.relays = state;
            self.local_change = true;
        }
    }

    /// Flip one relay locally.
    pub fn toggle(&mut self, relay: RelayId) {
        let mut next = self.relays;
        next.set(relay, !self.relays.get(relay));
        self.set_local(next);
    }

    /// Server-commanded state not yet picked up by the relay driver.
    pub fn take_remote_update(&mut self) -> Option<RelayState> {
        self.remote_update.take()
    }

    pub fn state(&self) -> RelayState {
        self.relays
    }
}

impl RelayPort for RelayBank {
    fn local_state(&self) -> RelayState {
        self.relays
    }

    fn take_local_change(&mut self) -> Option<RelayState> {
        core::mem::take(&mut self.local_change).then_some(self.relays)
    }

    fn apply_remote(&mut self, state: RelayState) {
        self.relays = state;
        self.remote_update = Some(state);
    }
}
