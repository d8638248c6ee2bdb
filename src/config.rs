//! Network client configuration
//!
//! Credentials, server base URL and every timing constant the link and sync
//! components use.  Built once by the host at boot and never mutated.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum SSID length in bytes (802.11).
pub const MAX_SSID_LEN: usize = 32;
/// Maximum WPA2 passphrase length in bytes.
pub const MAX_PASSWORD_LEN: usize = 64;
/// Maximum server base URL length in bytes.
pub const MAX_BASE_URL_LEN: usize = 128;

pub type Ssid = heapless::String<MAX_SSID_LEN>;
pub type Password = heapless::String<MAX_PASSWORD_LEN>;
pub type BaseUrl = heapless::String<MAX_BASE_URL_LEN>;

/// Errors from building or validating a [`NetConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID empty, longer than 32 bytes, or not printable ASCII.
    InvalidSsid,
    /// Passphrase neither empty (open network) nor 8-64 bytes.
    InvalidPassword,
    /// Base URL missing an `http://`/`https://` scheme, or too long.
    InvalidServerUrl,
    /// A timing field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::InvalidServerUrl => write!(f, "server URL must start with http:// or https://"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

/// Endpoint and timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetConfig {
    // --- Credentials ---
    pub ssid: Ssid,
    pub password: Password,

    // --- Server ---
    /// Base URL without trailing slash, e.g. `http://192.168.1.10:5000`
    pub server_url: BaseUrl,

    // --- Link ---
    /// Fixed interval between reconnect attempts while disconnected (ms)
    pub reconnect_interval_ms: u32,
    /// Link polls during `begin()` before giving up
    pub connect_attempts: u8,
    /// Delay between link polls during `begin()` (ms)
    pub connect_poll_ms: u32,

    // --- HTTP ---
    /// Timeout for POST requests (ms)
    pub http_timeout_ms: u32,
    /// Timeout for the relay-state GET (ms)
    pub poll_timeout_ms: u32,

    // --- Device loop cadence ---
    /// Telemetry report interval (ms)
    pub report_interval_ms: u32,
    /// Relay command poll interval (ms)
    pub relay_poll_interval_ms: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            ssid: Ssid::new(),
            password: Password::new(),
            server_url: BaseUrl::new(),

            reconnect_interval_ms: 30_000,
            connect_attempts: 20,
            connect_poll_ms: 500, // 20 x 500 ms = 10 s association window

            http_timeout_ms: 5_000,
            poll_timeout_ms: 5_000,

            report_interval_ms: 5_000,
            relay_poll_interval_ms: 2_000,
        }
    }
}

impl NetConfig {
    /// Build a validated configuration with default timings.
    ///
    /// A trailing `/` on `server_url` is dropped so endpoint paths join
    /// cleanly.
    pub fn new(ssid: &str, password: &str, server_url: &str) -> Result<Self, ConfigError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let base = validate_server_url(server_url)?;

        let mut config = Self::default();
        config.ssid.push_str(ssid).map_err(|()| ConfigError::InvalidSsid)?;
        config
            .password
            .push_str(password)
            .map_err(|()| ConfigError::InvalidPassword)?;
        config
            .server_url
            .push_str(base)
            .map_err(|()| ConfigError::InvalidServerUrl)?;
        Ok(config)
    }

    /// Re-check every field.  Used on configs built by hand or deserialized.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.ssid)?;
        validate_password(&self.password)?;
        let base = validate_server_url(&self.server_url)?;
        if base.len() != self.server_url.len() {
            return Err(ConfigError::ValidationFailed("server_url has trailing slash"));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("reconnect_interval_ms must be > 0"));
        }
        if self.connect_attempts == 0 {
            return Err(ConfigError::ValidationFailed("connect_attempts must be > 0"));
        }
        if self.http_timeout_ms == 0 || self.poll_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("HTTP timeouts must be > 0"));
        }
        if self.report_interval_ms == 0 || self.relay_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop intervals must be > 0"));
        }
        Ok(())
    }

    /// Total time `begin()` may block waiting for association (ms).
    pub fn association_window_ms(&self) -> u32 {
        u32::from(self.connect_attempts).saturating_mul(self.connect_poll_ms)
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN || !is_printable_ascii(ssid) {
        return Err(ConfigError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConfigError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > MAX_PASSWORD_LEN {
        return Err(ConfigError::InvalidPassword);
    }
    Ok(())
}

/// Returns the URL with any trailing slashes removed.
fn validate_server_url(url: &str) -> Result<&str, ConfigError> {
    let trimmed = url.trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or(ConfigError::InvalidServerUrl)?;
    if host.is_empty() || trimmed.len() > MAX_BASE_URL_LEN || !is_printable_ascii(trimmed) {
        return Err(ConfigError::InvalidServerUrl);
    }
    Ok(trimmed)
}
