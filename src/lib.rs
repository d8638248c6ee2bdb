//! Smart energy meter network client.
//!
//! Keeps the WiFi link up, reports measurements, and keeps the two relays
//! in sync with the server.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; the host build runs
//! against simulated adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
