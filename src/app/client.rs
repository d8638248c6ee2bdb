//! Sync client facade.
//!
//! [`SyncClient`] composes the link manager and the three server-facing
//! components around one shared HTTP transport.  Every call is synchronous
//! and serial; the transport is reused one request at a time.
//!
//! ```text
//!   WifiPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                │          SyncClient           │
//!   Clock ─────▶ │ LinkManager · Telemetry ·     │
//!                │ RelayNotifier · RelayPoller   │
//!                └──────────────┬───────────────┘
//!                               ▼
//!                         HttpTransport
//! ```

use core::net::Ipv4Addr;

use crate::config::{ConfigError, NetConfig};
use crate::error::{Result, SyncError};

use super::link::{LinkManager, LinkState};
use super::ports::{Clock, EventSink, HttpTransport, WifiPort};
use super::relay::{RelayCommandPoller, RelayPoll, RelayState, RelayStateNotifier};
use super::telemetry::{TelemetryReporter, TelemetrySnapshot};

pub struct SyncClient<W, H, C, S>
where
    W: WifiPort,
    H: HttpTransport,
    C: Clock,
    S: EventSink,
{
    link: LinkManager<W>,
    http: H,
    clock: C,
    sink: S,
    telemetry: TelemetryReporter,
    notifier: RelayStateNotifier,
    poller: RelayCommandPoller,
}

impl<W, H, C, S> SyncClient<W, H, C, S>
where
    W: WifiPort,
    H: HttpTransport,
    C: Clock,
    S: EventSink,
{
    /// Validate `config` and wire the components.  Does not touch the radio;
    /// call [`begin`](Self::begin) next.
    pub fn new(
        config: &NetConfig,
        wifi: W,
        http: H,
        clock: C,
        sink: S,
    ) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            link: LinkManager::new(wifi, config),
            http,
            clock,
            sink,
            telemetry: TelemetryReporter::new(config)?,
            notifier: RelayStateNotifier::new(config)?,
            poller: RelayCommandPoller::new(config)?,
        })
    }

    // ── Link ──────────────────────────────────────────────────

    /// Initial association, bounded to the configured window.
    pub fn begin(&mut self) -> Result<()> {
        self.link.begin(&mut self.clock, &mut self.sink)?;
        Ok(())
    }

    /// Per-cycle link upkeep.  Call every loop iteration.
    pub fn maintain(&mut self) {
        let now = self.clock.now_ms();
        self.link.maintain(now, &mut self.sink);
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn signal_strength(&self) -> Option<i8> {
        self.link.signal_strength()
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.link.address()
    }

    // ── Server exchanges ──────────────────────────────────────

    /// Report measurements.  `Ok` carries whatever status the server
    /// answered with, including error statuses.
    pub fn send(&mut self, snapshot: &TelemetrySnapshot) -> core::result::Result<u16, SyncError> {
        self.telemetry
            .send(&self.link, &mut self.http, &mut self.sink, snapshot)
    }

    /// Push local relay state after a local change.
    pub fn notify(&mut self, state: RelayState) -> core::result::Result<(), SyncError> {
        self.notifier
            .notify(&self.link, &mut self.http, &mut self.sink, state)
    }

    /// Poll the server for relay commands, folding every failure into
    /// "unchanged".
    pub fn poll(&mut self, current: RelayState) -> RelayPoll {
        self.try_poll(current).unwrap_or(RelayPoll::unchanged(current))
    }

    /// Like [`poll`](Self::poll) but keeps the failure reason.
    pub fn try_poll(&mut self, current: RelayState) -> core::result::Result<RelayPoll, SyncError> {
        self.poller
            .poll(&self.link, &mut self.http, &mut self.sink, current)
    }

    // ── Accessors ─────────────────────────────────────────────

    /// Milliseconds since boot, from the injected clock.
    pub fn uptime_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn link(&self) -> &LinkManager<W> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkManager<W> {
        &mut self.link
    }

    pub fn transport(&self) -> &H {
        &self.http
    }

    pub fn transport_mut(&mut self) -> &mut H {
        &mut self.http
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
