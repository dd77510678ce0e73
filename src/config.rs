//! System configuration parameters
//!
//! All tunable parameters for the Pindeck core. Held in memory only —
//! configuration intentionally does not survive a restart.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Monitoring ---
    /// Polling interval used when a subscription omits one (milliseconds)
    pub monitor_default_interval_ms: u32,
    /// Smallest interval a client may request; shorter requests are clamped up
    pub monitor_min_interval_ms: u32,

    // --- Housekeeping ---
    /// Cadence of the periodic health log line (seconds)
    pub health_log_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Monitoring
            monitor_default_interval_ms: 100, // 10 Hz
            monitor_min_interval_ms: 10,

            // Housekeeping
            health_log_interval_secs: 60, // 1/min
        }
    }
}
