//! Outbound application events.
//!
//! The link manager and sync components emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to serial, update a status line, etc.

use core::net::Ipv4Addr;

use crate::config::{BaseUrl, Ssid};
use crate::error::SyncError;

use super::relay::{RelayId, RelayState};

/// Structured events emitted by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Link(LinkEvent),
    Sync(SyncEvent),
}

/// Wireless link lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// `begin()` started associating.
    Associating { ssid: Ssid },

    /// `begin()` brought the link up.
    Associated {
        ip: Option<Ipv4Addr>,
        rssi: Option<i8>,
        server: BaseUrl,
    },

    /// `begin()` exhausted its polling window.
    AssociationFailed { attempts: u8 },

    /// A previously connected link went down.
    Lost,

    /// `maintain()` issued a reconnect.
    Reconnecting,

    /// The link came back after being down.
    Recovered { ip: Option<Ipv4Addr> },
}

/// Server exchanges.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Telemetry POST obtained a response (any status).
    TelemetryDelivered { status: u16 },

    /// Telemetry was dropped.
    TelemetryDropped(SyncError),

    /// Local relay state accepted by the server.
    RelayStatePushed(RelayState),

    /// Local relay state push was discarded.
    RelayPushFailed(SyncError),

    /// Server state differs from local for one relay.
    RemoteRelayCommand { relay: RelayId, on: bool },

    /// Relay poll produced no usable state.
    RelayPollFailed(SyncError),
}

impl From<LinkEvent> for AppEvent {
    fn from(e: LinkEvent) -> Self {
        Self::Link(e)
    }
}

impl From<SyncEvent> for AppEvent {
    fn from(e: SyncEvent) -> Self {
        Self::Sync(e)
    }
}
