//! Change notification fan-out.
//!
//! [`ChangeNotifier`] is the hub between the pin-state core and however
//! many observers are currently attached — zero is fine. Delivery is
//! fire-and-forget: each attached [`EventSink`] gets the event in turn,
//! with no queueing and no delivery guarantee. Consumers are UI and
//! observability sinks, never control-path dependents.
//!
//! The hub is `Clone` and `Send` so the request path and the monitor
//! thread publish through the same subscriber list.

use std::sync::{Arc, Mutex, PoisonError};

use crate::app::events::PinEvent;
use crate::app::ports::EventSink;
use crate::diagnostics::RuntimeStats;

/// Fan-out hub over the attached event sinks.
#[derive(Clone)]
pub struct ChangeNotifier {
    sinks: Arc<Mutex<Vec<Box<dyn EventSink + Send>>>>,
    stats: Arc<RuntimeStats>,
}

impl ChangeNotifier {
    pub fn new(stats: Arc<RuntimeStats>) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Vec::new())),
            stats,
        }
    }

    /// Attach a subscriber. Subscribers are never detached individually;
    /// they live as long as the notifier.
    pub fn attach(&self, sink: Box<dyn EventSink + Send>) {
        self.lock().push(sink);
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Box<dyn EventSink + Send>>> {
        // A panicked subscriber must not silence every other observer.
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for ChangeNotifier {
    fn emit(&mut self, event: &PinEvent) {
        match event {
            PinEvent::MonitorBatch(_) => self.stats.record_batch(),
            _ => self.stats.record_event(),
        }
        for sink in self.lock().iter_mut() {
            sink.emit(event);
        }
    }
}
