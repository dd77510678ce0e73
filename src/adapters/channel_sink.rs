//! Event bridge toward the front-end I/O task.
//!
//! Uses an `embassy-sync` bounded MPMC channel to hand pin events from the
//! synchronous core (request path and monitor thread) to the async task
//! that pushes them to connected clients. The channel is static so both
//! sides share it without wiring.
//!
//! ```text
//! ┌──────────────┐   PinEvent   ┌──────────────┐
//! │  Core        │─────────────▶│  I/O Task    │
//! │  (sync)      │  try_send    │  (async)     │
//! └──────────────┘              └──────────────┘
//! ```
//!
//! Delivery is best-effort: when the I/O task falls behind and the channel
//! fills, the event is dropped and counted. Observers resynchronize from
//! the next event or monitor batch.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::debug;

use crate::app::events::PinEvent;
use crate::app::ports::EventSink;
use crate::diagnostics::RuntimeStats;

/// Channel depth for outbound events. Sized for a burst of mutations plus
/// in-flight monitor batches.
const EVENT_DEPTH: usize = 16;

/// Outbound event channel: core → I/O task.
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, PinEvent, EVENT_DEPTH> = Channel::new();

/// [`EventSink`] half of the bridge, attached to the notifier.
pub struct ChannelEventSink {
    stats: Arc<RuntimeStats>,
}

impl ChannelEventSink {
    pub fn new(stats: Arc<RuntimeStats>) -> Self {
        Self { stats }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&mut self, event: &PinEvent) {
        if EVENT_CHANNEL.try_send(event.clone()).is_err() {
            self.stats.record_drop();
            debug!("event bridge full, event dropped");
        }
    }
}

/// Non-blocking receive for synchronous consumers and tests. The async
/// I/O task awaits `EVENT_CHANNEL.receive()` directly instead.
pub fn try_next_event() -> Option<PinEvent> {
    EVENT_CHANNEL.try_receive().ok()
}
