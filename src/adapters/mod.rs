//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                  |
//! |------------|----------------|------------------------------|
//! | `board`    | MeterPort      | Metering front-end mailbox   |
//! |            | RelayPort      | Relay driver mailbox         |
//! | `http`     | HttpTransport  | ESP-IDF HTTP client / TCP    |
//! | `log_sink` | EventSink      | Serial log output            |
//! | `time`     | Clock          | ESP32 system timer           |
//! | `wifi`     | WifiPort       | ESP-IDF WiFi STA             |

pub mod board;
pub mod http;
pub mod log_sink;
pub mod time;
pub mod wifi;
