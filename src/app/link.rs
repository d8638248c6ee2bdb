//! WiFi link lifecycle.
//!
//! [`LinkManager`] owns the only copy of [`LinkState`].  `begin()` performs
//! the bounded initial association; `maintain()` is called every device
//! cycle and re-associates at a fixed interval while the link is down.
//!
//! ```text
//!          begin() ok / maintain() sees link
//!   Disconnected ───────────────────────────▶ Connected
//!        ▲  │                                     │
//!        │  └─ every reconnect_interval_ms:       │
//!        │     disconnect + start_association     │
//!        └──────────── link drops ────────────────┘
//! ```

use core::net::Ipv4Addr;

use log::warn;

use crate::config::NetConfig;
use crate::error::LinkError;

use super::events::LinkEvent;
use super::ports::{Clock, EventSink, WifiPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// Read-only connectivity check consumed by the sync components.
pub trait LinkStatus {
    fn is_connected(&self) -> bool;
}

pub struct LinkManager<W: WifiPort> {
    wifi: W,
    state: LinkState,
    /// Uptime at the last reconnect attempt.  Starts at 0 (boot).
    last_reconnect_ms: u64,
    config: NetConfig,
}

impl<W: WifiPort> LinkManager<W> {
    pub fn new(wifi: W, config: &NetConfig) -> Self {
        Self {
            wifi,
            state: LinkState::Disconnected,
            last_reconnect_ms: 0,
            config: config.clone(),
        }
    }

    /// Associate with the configured AP, blocking for at most
    /// `connect_attempts × connect_poll_ms`.
    ///
    /// Failure is non-fatal: the state stays `Disconnected` and
    /// [`maintain`](Self::maintain) keeps retrying.
    pub fn begin(
        &mut self,
        clock: &mut impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<(), LinkError> {
        sink.emit(
            &LinkEvent::Associating {
                ssid: self.config.ssid.clone(),
            }
            .into(),
        );

        if let Err(e) = self
            .wifi
            .start_association(&self.config.ssid, &self.config.password)
        {
            self.state = LinkState::Disconnected;
            sink.emit(&LinkEvent::AssociationFailed { attempts: 0 }.into());
            return Err(e);
        }

        let mut attempts = 0;
        while !self.wifi.is_associated() && attempts < self.config.connect_attempts {
            clock.sleep_ms(self.config.connect_poll_ms);
            attempts += 1;
        }

        if self.wifi.is_associated() {
            self.state = LinkState::Connected;
            sink.emit(
                &LinkEvent::Associated {
                    ip: self.wifi.ip_address(),
                    rssi: self.wifi.rssi(),
                    server: self.config.server_url.clone(),
                }
                .into(),
            );
            Ok(())
        } else {
            self.state = LinkState::Disconnected;
            sink.emit(&LinkEvent::AssociationFailed { attempts }.into());
            Err(LinkError::AssociationFailed)
        }
    }

    /// Non-blocking per-cycle upkeep.  Issues at most one reconnect per
    /// `reconnect_interval_ms` while the link is down.
    pub fn maintain(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        if self.wifi.is_associated() {
            if self.state == LinkState::Disconnected {
                self.state = LinkState::Connected;
                sink.emit(
                    &LinkEvent::Recovered {
                        ip: self.wifi.ip_address(),
                    }
                    .into(),
                );
            }
            return;
        }

        if self.state == LinkState::Connected {
            sink.emit(&LinkEvent::Lost.into());
        }
        self.state = LinkState::Disconnected;

        let elapsed = now_ms.saturating_sub(self.last_reconnect_ms);
        if elapsed >= u64::from(self.config.reconnect_interval_ms) {
            self.last_reconnect_ms = now_ms;
            sink.emit(&LinkEvent::Reconnecting.into());
            self.wifi.disconnect();
            if let Err(e) = self
                .wifi
                .start_association(&self.config.ssid, &self.config.password)
            {
                warn!("WiFi: reconnect request rejected: {}", e);
            }
        }
    }

    /// Cached state and a live link check must agree.
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected && self.wifi.is_associated()
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Signal strength in dBm.
    pub fn signal_strength(&self) -> Option<i8> {
        self.wifi.rssi()
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.wifi.ip_address()
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut W {
        &mut self.wifi
    }
}

impl<W: WifiPort> LinkStatus for LinkManager<W> {
    fn is_connected(&self) -> bool {
        LinkManager::is_connected(self)
    }
}
