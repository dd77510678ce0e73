//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements  | Connects to                       |
//! |----------------|-------------|-----------------------------------|
//! | `esp_gpio`     | GpioPort    | ESP32-S3 GPIO pads + LEDC PWM     |
//! | `mock_gpio`    | GpioPort    | Deterministic in-memory state     |
//! | `log_sink`     | EventSink   | Serial log output                 |
//! | `channel_sink` | EventSink   | embassy-sync bridge to I/O task   |
//! | `time`         | —           | esp_timer / `std::time::Instant`  |

pub mod channel_sink;
pub mod esp_gpio;
pub mod log_sink;
pub mod mock_gpio;
pub mod time;
