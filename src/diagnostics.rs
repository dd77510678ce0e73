//! Runtime diagnostics.
//!
//! Lock-free counters accumulated across the service, the notifier, and
//! the event bridge, collected on demand into a [`ServiceHealth`] snapshot
//! for the health surface. Everything here is in-memory only and resets on
//! restart.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Shared operation/event counters. Cheap to bump from any thread.
#[derive(Debug, Default)]
pub struct RuntimeStats {
    ops: AtomicU64,
    events_published: AtomicU64,
    events_dropped: AtomicU64,
    monitor_batches: AtomicU64,
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// One boundary operation handled (successful or not).
    pub fn record_op(&self) {
        self.ops.fetch_add(1, Ordering::Relaxed);
    }

    /// One state-change event delivered to the notifier.
    pub fn record_event(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    /// One event dropped by a best-effort sink (e.g. bridge channel full).
    pub fn record_drop(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// One monitoring batch published.
    pub fn record_batch(&self) {
        self.monitor_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ops_total(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn monitor_batches(&self) -> u64 {
        self.monitor_batches.load(Ordering::Relaxed)
    }
}

/// Point-in-time health report for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    /// Always `"ok"` while the process is alive to answer.
    pub status: &'static str,
    pub uptime_secs: u64,
    pub configured_pins: usize,
    pub monitor_active: bool,
    pub ops_total: u64,
    pub events_published: u64,
    pub events_dropped: u64,
    pub monitor_batches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = RuntimeStats::new();
        stats.record_op();
        stats.record_op();
        stats.record_event();
        stats.record_drop();
        stats.record_batch();
        assert_eq!(stats.ops_total(), 2);
        assert_eq!(stats.events_published(), 1);
        assert_eq!(stats.events_dropped(), 1);
        assert_eq!(stats.monitor_batches(), 1);
    }
}
