//! WiFi station-mode adapter.
//!
//! Implements [`WifiPort`], the hexagonal boundary for the radio.  The
//! adapter only issues requests and answers live status queries; the
//! retry policy lives in [`LinkManager`](crate::app::link::LinkManager).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulated radio with a switchable access point,
//!   for host-side tests.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::WifiPort;
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
use esp_idf_hal::modem::Modem;
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,

    /// Simulation: access point in range and accepting clients.
    #[cfg(not(target_os = "espidf"))]
    sim_ap_available: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_associated: bool,
    /// Simulation: counts association requests.
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let wifi = EspWifi::new(modem, sysloop, nvs).context("EspWifi init failed")?;
        Ok(Self { wifi })
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Simulated radio with the access point in range.
    pub fn new() -> Self {
        Self {
            sim_ap_available: true,
            sim_associated: false,
            sim_connect_counter: 0,
        }
    }

    /// Bring the simulated access point up or down.  Taking it down drops
    /// any current association.
    pub fn set_ap_available(&mut self, available: bool) {
        self.sim_ap_available = available;
        if !available && self.sim_associated {
            info!("WiFi(sim): access point lost");
            self.sim_associated = false;
        }
    }

    /// Association requests issued so far.
    pub fn connect_requests(&self) -> u32 {
        self.sim_connect_counter
    }
}

impl WifiAdapter {
    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| LinkError::DriverRejected)?,
            password: password.try_into().map_err(|_| LinkError::DriverRejected)?,
            auth_method,
            ..Default::default()
        });
        self.wifi.set_configuration(&conf).map_err(|e| {
            warn!("WiFi: set_configuration failed: {:?}", e);
            LinkError::DriverRejected
        })?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {:?}", e);
                LinkError::DriverRejected
            })?;
        }
        // Non-blocking: association completes in the driver task.
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {:?}", e);
            LinkError::DriverRejected
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, ssid: &str, _password: &str) -> Result<(), LinkError> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        if self.sim_ap_available {
            self.sim_associated = true;
            info!(
                "WiFi(sim): associated with '{}' (request {})",
                ssid, self.sim_connect_counter
            );
        } else {
            warn!("WiFi(sim): '{}' not in range (request {})", ssid, self.sim_connect_counter);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_associated = false;
    }

    /// Associated and the station netif has an address.
    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_associated
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        if !self.platform_is_connected() {
            return None;
        }
        let mut ap_info: esp_idf_sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        // SAFETY: `ap_info` is a valid, writable record for the driver to fill.
        let err = unsafe { esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (err == esp_idf_sys::ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        if !self.sim_associated {
            return None;
        }
        // -66..=-55 dBm, varying with the number of association requests.
        let oscillation = (self.sim_connect_counter % 12) as i8 - 6;
        Some((-60_i8).saturating_add(oscillation))
    }

    #[cfg(target_os = "espidf")]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        self.sim_associated.then_some(Ipv4Addr::new(192, 168, 4, 2))
    }
}

// ───────────────────────────────────────────────────────────────
// WifiPort
// ───────────────────────────────────────────────────────────────

impl WifiPort for WifiAdapter {
    fn start_association(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        info!("WiFi: connecting to '{}'", ssid);
        self.platform_connect(ssid, password)
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
    }

    fn is_associated(&self) -> bool {
        self.platform_is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        self.platform_rssi()
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        self.platform_ip()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
