//! Application core: link lifecycle and server sync logic, zero direct I/O.
//!
//! Everything that touches the radio, the network stack, or the clock goes
//! through the **port traits** in [`ports`], keeping this layer testable on
//! the host with mock adapters.

pub mod client;
pub mod events;
pub mod link;
pub mod ports;
pub mod relay;
pub mod service;
pub mod telemetry;
pub mod wire;
