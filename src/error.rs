//! Unified error types for the smart meter network client.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! device loop's error handling uniform.  All variants are `Copy` so they
//! can be carried inside events and tick reports without allocation.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the client funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Wireless association failed.
    Link(LinkError),
    /// A server exchange failed.
    Sync(SyncError),
    /// The HTTP transport could not complete a request.
    Transport(TransportError),
    /// Endpoint configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Sync(e) => write!(f, "sync: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The WiFi driver rejected the station configuration or start request.
    DriverRejected,
    /// The bounded association window elapsed without a link.
    AssociationFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriverRejected => write!(f, "WiFi driver rejected association request"),
            Self::AssociationFailed => write!(f, "WiFi association timed out"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// The request was attempted but no HTTP response was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// URL could not be parsed.
    InvalidUrl,
    /// Scheme not supported by this transport (e.g. `https` on the host).
    UnsupportedScheme,
    /// DNS resolution or TCP connect failed.
    Connect,
    /// The request or response exceeded its timeout.
    Timeout,
    /// Socket read/write failed mid-request.
    Io,
    /// Bytes came back but did not form an HTTP response.
    MalformedResponse,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => write!(f, "invalid URL"),
            Self::UnsupportedScheme => write!(f, "unsupported URL scheme"),
            Self::Connect => write!(f, "connect failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::Io => write!(f, "I/O error"),
            Self::MalformedResponse => write!(f, "malformed HTTP response"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Why a telemetry report, relay push, or relay poll did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// Link is down; no I/O was attempted.
    NotConnected,
    /// No response was obtained.
    Transport(TransportError),
    /// A response arrived with a status the operation does not accept.
    UnexpectedStatus(u16),
    /// The response body was not the expected JSON document.
    MalformedPayload,
    /// The outgoing payload did not fit its fixed-size buffer.
    PayloadTooLarge,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to WiFi"),
            Self::Transport(e) => write!(f, "no response ({e})"),
            Self::UnexpectedStatus(code) => write!(f, "HTTP {code}"),
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<SyncError> for Error {
    fn from(e: SyncError) -> Self {
        Self::Sync(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
