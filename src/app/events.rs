//! Outbound pin-state events.
//!
//! The registry and monitor emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, push to RPC subscribers,
//! repaint the on-device display.

use serde::{Deserialize, Serialize};

use crate::registry::PinSnapshot;

/// Structured events emitted by the pin-state core.
///
/// Every mutating registry operation publishes exactly one event carrying
/// the same snapshot it returned to its caller. Polling-sourced reads are
/// batched separately as [`PinEvent::MonitorBatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PinEvent {
    /// A pin was (re)configured.
    Configured(PinSnapshot),

    /// A configured pin's cached state changed (write or PWM update).
    Changed(PinSnapshot),

    /// A pin's configuration was released.
    Released { pin: u8 },

    /// Every configured pin was released.
    AllReleased { count: usize },

    /// One polling pass over the subscribed pin set.
    MonitorBatch(MonitorBatch),
}

/// Aggregated result of one monitoring tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorBatch {
    /// Milliseconds since boot when the batch was sampled (monotonic).
    pub uptime_ms: u64,
    /// One snapshot per subscribed-and-configured pin; pins that are
    /// unconfigured or failed to read are omitted.
    pub readings: Vec<PinSnapshot>,
}
