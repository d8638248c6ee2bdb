//! Device service: per-tick orchestration of the sync client.
//!
//! [`DeviceService`] is what the firmware main loop calls once per cycle.
//! It owns the reporting and polling cadence, turns local relay changes into
//! edge-triggered pushes, and hands server commands back to the relay
//! drivers.  All I/O flows through the client and the collaborator ports.
//!
//! ```text
//!  MeterPort ──▶ ┌────────────────────────┐ ──▶ SyncClient
//!                │     DeviceService       │
//!  RelayPort ◀──▶│ cadence · edge pushes   │
//!                └────────────────────────┘
//! ```
//!
//! Order within one tick: maintain link → push local change → telemetry →
//! poll.  Pushing before polling keeps a fresh local change from being
//! overwritten by the server's stale copy in the same cycle.  Polled state is
//! held back while the boot publish is still pending or a push failed in the
//! same tick: the server has not seen the local state yet.

use log::{info, warn};

use crate::config::NetConfig;
use crate::error::SyncError;

use super::client::SyncClient;
use super::ports::{Clock, EventSink, HttpTransport, MeterPort, RelayPort, WifiPort};
use super::relay::RelayState;

/// What one [`DeviceService::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Link state after `maintain()`.
    pub connected: bool,
    /// Telemetry attempt this tick.
    pub telemetry: Option<Result<u16, SyncError>>,
    /// Relay push attempt this tick.
    pub pushed: Option<Result<(), SyncError>>,
    /// Server-commanded state applied to the relays this tick.
    pub applied: Option<RelayState>,
}

pub struct DeviceService {
    report_interval_ms: u64,
    poll_interval_ms: u64,
    last_report_ms: Option<u64>,
    last_poll_ms: Option<u64>,
    /// Publish the boot-time relay state once the link is first up.
    /// Cleared only by a push the server answered with 200.
    initial_push_pending: bool,
    /// Last boot publish that reached the transport and failed.
    last_boot_push_ms: Option<u64>,
    tick_count: u64,
}

impl DeviceService {
    pub fn new(config: &NetConfig) -> Self {
        Self {
            report_interval_ms: u64::from(config.report_interval_ms),
            poll_interval_ms: u64::from(config.relay_poll_interval_ms),
            last_report_ms: None,
            last_poll_ms: None,
            initial_push_pending: true,
            last_boot_push_ms: None,
            tick_count: 0,
        }
    }

    /// Run one device cycle.
    pub fn tick<W, H, C, S>(
        &mut self,
        client: &mut SyncClient<W, H, C, S>,
        meter: &mut impl MeterPort,
        relays: &mut impl RelayPort,
    ) -> TickReport
    where
        W: WifiPort,
        H: HttpTransport,
        C: Clock,
        S: EventSink,
    {
        self.tick_count += 1;

        // 1. Link upkeep
        client.maintain();
        let now = client.uptime_ms();
        let mut report = TickReport {
            connected: client.is_connected(),
            ..TickReport::default()
        };

        // 2. Edge-triggered relay push
        if let Some(state) = relays.take_local_change() {
            let result = client.notify(state);
            self.record_push(result, now);
            report.pushed = Some(result);
        } else if self.initial_push_pending
            && report.connected
            && due(self.last_boot_push_ms, now, self.poll_interval_ms)
        {
            let state = relays.local_state();
            info!("Publishing boot relay state ({})", state);
            let result = client.notify(state);
            self.record_push(result, now);
            report.pushed = Some(result);
        }
        let hold_remote = self.initial_push_pending || matches!(report.pushed, Some(Err(_)));

        // 3. Telemetry
        if due(self.last_report_ms, now, self.report_interval_ms) {
            self.last_report_ms = Some(now);
            if let Some(snapshot) = meter.latest_snapshot() {
                report.telemetry = Some(client.send(&snapshot));
            }
        }

        // 4. Relay command poll
        if due(self.last_poll_ms, now, self.poll_interval_ms) {
            self.last_poll_ms = Some(now);
            let outcome = client.poll(relays.local_state());
            if outcome.changed && hold_remote {
                warn!(
                    "Server relay state {} held back: local state not yet published",
                    outcome.state
                );
            } else if outcome.changed {
                relays.apply_remote(outcome.state);
                report.applied = Some(outcome.state);
            }
        }

        report
    }

    /// Ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn initial_push_pending(&self) -> bool {
        self.initial_push_pending
    }

    /// Any push that the server accepted also publishes the boot state.
    /// A push that never left the device is retried as soon as the link is up.
    fn record_push(&mut self, result: Result<(), SyncError>, now: u64) {
        match result {
            Ok(()) => self.initial_push_pending = false,
            Err(SyncError::NotConnected) => {}
            Err(_) => self.last_boot_push_ms = Some(now),
        }
    }
}

fn due(last: Option<u64>, now: u64, interval: u64) -> bool {
    last.is_none_or(|t| now.saturating_sub(t) >= interval)
}
