//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                     |
//! |----------------|--------------|---------------------------------|
//! | `log_sink`     | EventSink    | Serial log output               |
//! | `time`         | Clock        | ESP32 system timer              |
//! | `wifi`         | WifiDriver   | ESP-IDF WiFi STA + soft-AP      |
//! | `wifi_events`  | EventSource  | ESP-IDF system event loop       |

pub mod log_sink;
pub mod time;
pub mod wifi;
#[cfg(target_os = "espidf")]
pub mod wifi_events;
