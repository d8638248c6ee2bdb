//! Telemetry reporting: fire-and-forget measurement delivery.

use crate::config::{ConfigError, NetConfig};
use crate::error::{SyncError, TransportError};

use super::events::SyncEvent;
use super::link::LinkStatus;
use super::ports::{EventSink, HttpRequest, HttpTransport};
use super::wire::{self, Url};

/// One set of electrical measurements, SI units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySnapshot {
    /// Mains RMS voltage (V).
    pub voltage: f32,
    /// Branch currents (A).
    pub current1: f32,
    pub current2: f32,
    pub current3: f32,
    pub total_current: f32,
    /// Branch real power (W).
    pub power1: f32,
    pub power2: f32,
    pub total_power: f32,
}

/// POSTs snapshots to `{base}/api/data`.
///
/// Delivery succeeds when *any* HTTP response comes back, error statuses
/// included.  Only a transport-level failure counts as a drop.  Nothing is
/// retried or buffered.
#[derive(Debug, Clone)]
pub struct TelemetryReporter {
    url: Url,
    timeout_ms: u32,
}

impl TelemetryReporter {
    pub fn new(config: &NetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: wire::join_url(&config.server_url, wire::TELEMETRY_PATH)?,
            timeout_ms: config.http_timeout_ms,
        })
    }

    /// Deliver `snapshot`.  Returns the HTTP status the server answered with.
    pub fn send(
        &self,
        link: &impl LinkStatus,
        http: &mut impl HttpTransport,
        sink: &mut impl EventSink,
        snapshot: &TelemetrySnapshot,
    ) -> Result<u16, SyncError> {
        let result = self.deliver(link, http, snapshot);
        let event = match result {
            Ok(status) => SyncEvent::TelemetryDelivered { status },
            Err(e) => SyncEvent::TelemetryDropped(e),
        };
        sink.emit(&event.into());
        result
    }

    fn deliver(
        &self,
        link: &impl LinkStatus,
        http: &mut impl HttpTransport,
        snapshot: &TelemetrySnapshot,
    ) -> Result<u16, SyncError> {
        if !link.is_connected() {
            return Err(SyncError::NotConnected);
        }
        let body = wire::encode_telemetry(snapshot)?;
        let response = http.execute(&HttpRequest::post_json(&self.url, &body, self.timeout_ms))?;
        // A status of 0 is how some stacks report "no response".
        if response.status == 0 {
            return Err(SyncError::Transport(TransportError::MalformedResponse));
        }
        Ok(response.status)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
