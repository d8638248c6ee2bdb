//! Port traits: the hexagonal boundary between sync logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SyncClient / DeviceService (domain)
//! ```
//!
//! Driven adapters (WiFi driver, HTTP stack, clock, event sink) implement
//! these traits and are injected into [`SyncClient`](super::client::SyncClient).
//! The firmware-side collaborators (sensor sampler, relay drivers) reach the
//! [`DeviceService`](super::service::DeviceService) through [`MeterPort`] and
//! [`RelayPort`].

use core::net::Ipv4Addr;

use crate::error::{LinkError, TransportError};

use super::events::AppEvent;
use super::relay::RelayState;
use super::telemetry::TelemetrySnapshot;

// ───────────────────────────────────────────────────────────────
// WiFi port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Station-mode wireless link.
pub trait WifiPort {
    /// Configure STA mode with the given credentials and begin associating.
    /// Must not block waiting for the link; poll [`is_associated`](Self::is_associated).
    fn start_association(&mut self, ssid: &str, password: &str) -> Result<(), LinkError>;

    /// Drop the current association (no-op if already down).
    fn disconnect(&mut self);

    /// Live check: associated with the AP and holding an address.
    fn is_associated(&self) -> bool;

    /// Signal strength of the current AP in dBm.
    fn rssi(&self) -> Option<i8>;

    /// Address assigned to the station interface.
    fn ip_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// HTTP transport port (driven adapter: domain → server)
// ───────────────────────────────────────────────────────────────

/// Response bodies are read into a fixed buffer of this size.
pub const RESPONSE_BODY_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One HTTP exchange.  The transport opens a connection for it and closes
/// that connection before returning.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: HttpMethod,
    pub url: &'a str,
    pub content_type: Option<&'static str>,
    pub body: &'a [u8],
    pub timeout_ms: u32,
}

impl<'a> HttpRequest<'a> {
    pub fn get(url: &'a str, timeout_ms: u32) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            content_type: None,
            body: &[],
            timeout_ms,
        }
    }

    pub fn post_json(url: &'a str, body: &'a [u8], timeout_ms: u32) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            content_type: Some("application/json"),
            body,
            timeout_ms,
        }
    }
}

/// A response that made it back end-to-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: heapless::Vec<u8, RESPONSE_BODY_CAPACITY>,
    /// The server sent more than [`RESPONSE_BODY_CAPACITY`] bytes.
    pub truncated: bool,
}

impl HttpResponse {
    /// Build a response, truncating `body` to the buffer capacity.
    pub fn new(status: u16, body: &[u8]) -> Self {
        let n = body.len().min(RESPONSE_BODY_CAPACITY);
        let mut buf = heapless::Vec::new();
        // Cannot fail: `n` is within capacity.
        let _ = buf.extend_from_slice(&body[..n]);
        Self {
            status,
            body: buf,
            truncated: n < body.len(),
        }
    }
}

/// Blocking request/response transport.
pub trait HttpTransport {
    /// Perform `request` and wait (bounded by `request.timeout_ms`) for the
    /// response.  `Err` means no response was obtained.
    fn execute(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus a blocking delay.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The client emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, display status line, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Firmware collaborator ports
// ───────────────────────────────────────────────────────────────

/// Source of electrical measurements (the sensor sampler).
pub trait MeterPort {
    /// Most recent complete measurement set, if any has been taken yet.
    fn latest_snapshot(&mut self) -> Option<TelemetrySnapshot>;
}

/// The device's local authoritative relay state.
pub trait RelayPort {
    /// Current commanded relay state.
    fn local_state(&self) -> RelayState;

    /// Returns the new state if it changed locally (IR remote, button)
    /// since the last call.  Edge-triggered: a change is reported once.
    fn take_local_change(&mut self) -> Option<RelayState>;

    /// Apply a state commanded by the server.  Must not be reported back
    /// through [`take_local_change`](Self::take_local_change).
    fn apply_remote(&mut self, state: RelayState);
}
