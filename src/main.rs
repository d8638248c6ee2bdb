//! Smart Energy Meter: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  WifiAdapter   HttpAdapter   SystemClock   LogEventSink    │
//! │  (WifiPort)    (Transport)   (Clock)       (EventSink)     │
//! │  MeterReadings (MeterPort)   RelayBank (RelayPort)         │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ──────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │  SyncClient: LinkManager · Telemetry · Relay sync    │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │  DeviceService (100 ms loop)                               │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use smartmeter::adapters::board::{MeterReadings, RelayBank};
use smartmeter::adapters::http::HttpAdapter;
use smartmeter::adapters::log_sink::LogEventSink;
use smartmeter::adapters::time::SystemClock;
use smartmeter::adapters::wifi::WifiAdapter;
use smartmeter::app::client::SyncClient;
use smartmeter::app::relay::RelayState;
use smartmeter::app::service::DeviceService;
use smartmeter::config::NetConfig;
use smartmeter::error::Error;

const LOOP_PERIOD_MS: u32 = 100;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Smart Meter v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Network config (build-time) ────────────────────────
    let config = NetConfig::new(
        option_env!("WIFI_SSID").unwrap_or("SmartMeter"),
        option_env!("WIFI_PASS").unwrap_or(""),
        option_env!("SERVER_URL").unwrap_or("http://192.168.1.100:5000"),
    )
    .map_err(Error::from)?;

    // ── 3. Adapters ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    let wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;
    let mut client = SyncClient::new(
        &config,
        wifi,
        HttpAdapter::new(),
        SystemClock::new(),
        LogEventSink::new(),
    )
    .map_err(Error::from)?;
    let mut meter = MeterReadings::new();
    let mut relays = RelayBank::new(RelayState::default());
    let mut service = DeviceService::new(&config);

    // ── 4. Initial association ────────────────────────────────
    // A failed window is not fatal; maintain() keeps retrying.
    if let Err(e) = client.begin() {
        warn!("Initial connection failed ({}), continuing offline", e);
    }

    // ── 5. Device loop ────────────────────────────────────────
    info!("Entering main loop ({} ms period)", LOOP_PERIOD_MS);
    loop {
        let report = service.tick(&mut client, &mut meter, &mut relays);
        if report.applied.is_some() {
            if let Some(state) = relays.take_remote_update() {
                info!("Relays set by server: {}", state);
            }
        }
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
