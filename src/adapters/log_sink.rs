//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, LinkEvent, SyncEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    fn link(event: &LinkEvent) {
        match event {
            LinkEvent::Associating { ssid } => {
                info!("LINK | connecting to '{}'", ssid);
            }
            LinkEvent::Associated { ip, rssi, server } => {
                info!("LINK | connected");
                match ip {
                    Some(ip) => info!("LINK | ip={}", ip),
                    None => info!("LINK | ip=<pending>"),
                }
                match rssi {
                    Some(rssi) => info!("LINK | rssi={} dBm", rssi),
                    None => info!("LINK | rssi=<unknown>"),
                }
                info!("LINK | server={}", server);
            }
            LinkEvent::AssociationFailed { attempts } => {
                warn!("LINK | connection failed after {} polls", attempts);
                warn!("LINK |   check the SSID and password");
                warn!("LINK |   check the router is powered on");
                warn!("LINK |   check the device is within range");
            }
            LinkEvent::Lost => warn!("LINK | connection lost"),
            LinkEvent::Reconnecting => info!("LINK | reconnecting"),
            LinkEvent::Recovered { ip } => match ip {
                Some(ip) => info!("LINK | reconnected, ip={}", ip),
                None => info!("LINK | reconnected"),
            },
        }
    }

    fn sync(event: &SyncEvent) {
        match event {
            SyncEvent::TelemetryDelivered { status } => {
                info!("SYNC | telemetry sent, status={}", status);
            }
            SyncEvent::TelemetryDropped(e) => warn!("SYNC | telemetry dropped: {}", e),
            SyncEvent::RelayStatePushed(state) => info!("SYNC | relay state pushed: {}", state),
            SyncEvent::RelayPushFailed(e) => warn!("SYNC | relay push failed: {}", e),
            SyncEvent::RemoteRelayCommand { relay, on } => {
                info!(
                    "SYNC | server command: {} -> {}",
                    relay,
                    if *on { "ON" } else { "OFF" }
                );
            }
            SyncEvent::RelayPollFailed(e) => warn!("SYNC | relay poll failed: {}", e),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Link(e) => Self::link(e),
            AppEvent::Sync(e) => Self::sync(e),
        }
    }
}
