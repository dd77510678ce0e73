//! GPIO application service — the front-end boundary.
//!
//! [`GpioService`] owns the registry (behind the single coarse lock), the
//! change notifier, the background monitor, and the runtime counters. Both
//! front-ends — the request/notification transport and the on-device GUI —
//! are thin adapters over this surface; neither touches the registry
//! directly.
//!
//! ```text
//!  PinCommand ──▶ ┌──────────────────────────────┐ ──▶ EventSink(s)
//!                 │         GpioService          │
//!    GpioPort ◀───│  Registry · Safety · Monitor │
//!                 └──────────────────────────────┘
//! ```
//!
//! Every mutating operation returns the resulting snapshot to its caller
//! *and* publishes exactly one event with the same payload, so every
//! subscriber observes every state transition once per mutation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;

use crate::adapters::time::MonotonicClock;
use crate::app::commands::{CommandReply, PinCommand, PinInventory};
use crate::app::ports::{EventSink, GpioPort};
use crate::config::SystemConfig;
use crate::diagnostics::{RuntimeStats, ServiceHealth};
use crate::error::{Error, Result};
use crate::monitor::{MonitorSpec, PinMonitor};
use crate::notifier::ChangeNotifier;
use crate::pins::{self, MAX_MONITORED_PINS};
use crate::registry::{ConfigureRequest, PinRegistry, PinSnapshot};

/// The application service orchestrating the pin-state core.
pub struct GpioService<A: GpioPort> {
    config: SystemConfig,
    registry: Arc<Mutex<PinRegistry<A>>>,
    notifier: ChangeNotifier,
    monitor: PinMonitor,
    stats: Arc<RuntimeStats>,
    clock: MonotonicClock,
}

impl<A: GpioPort + Send + 'static> GpioService<A> {
    /// Construct the service over an injected hardware adapter.
    /// The adapter choice (real vs mock) is the only platform decision.
    pub fn new(adapter: A, config: SystemConfig) -> Self {
        let stats = Arc::new(RuntimeStats::new());
        Self {
            config,
            registry: Arc::new(Mutex::new(PinRegistry::new(adapter))),
            notifier: ChangeNotifier::new(stats.clone()),
            monitor: PinMonitor::new(),
            stats,
            clock: MonotonicClock::new(),
        }
    }

    /// Attach an observer to the change notifier.
    pub fn attach_sink(&self, sink: Box<dyn EventSink + Send>) {
        self.notifier.attach(sink);
    }

    /// Shared registry handle, for collaborators that need several
    /// operations under one lock acquisition (e.g. a GUI repaint).
    pub fn registry_handle(&self) -> Arc<Mutex<PinRegistry<A>>> {
        self.registry.clone()
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    /// Shared counter handle, for sinks that do their own drop accounting.
    pub fn stats_arc(&self) -> Arc<RuntimeStats> {
        self.stats.clone()
    }

    // ── Query operations ──────────────────────────────────────

    /// Available, reserved, and currently configured pins.
    pub fn list_pins(&self) -> PinInventory {
        self.stats.record_op();
        let reg = self.lock_registry();
        PinInventory {
            available_pins: reg.available_pins(),
            reserved_pins: pins::RESERVED_PINS.to_vec(),
            configured_pins: reg.all_pins_info(),
        }
    }

    /// Snapshot of one configured pin.
    pub fn get_pin(&self, pin: u8) -> Result<PinSnapshot> {
        self.stats.record_op();
        self.lock_registry().pin_info(pin).ok_or(Error::NotFound(pin))
    }

    /// Service liveness and counters.
    pub fn health(&self) -> ServiceHealth {
        ServiceHealth {
            status: "ok",
            uptime_secs: self.clock.uptime_secs(),
            configured_pins: self.lock_registry().configured_count(),
            monitor_active: self.monitor.is_running(),
            ops_total: self.stats.ops_total(),
            events_published: self.stats.events_published(),
            events_dropped: self.stats.events_dropped(),
            monitor_batches: self.stats.monitor_batches(),
        }
    }

    // ── Mutating operations ───────────────────────────────────

    /// Configure (or destructively reconfigure) a pin.
    pub fn configure_pin(&self, req: &ConfigureRequest) -> Result<PinSnapshot> {
        self.stats.record_op();
        let mut sink = self.notifier.clone();
        self.lock_registry().configure(req, &mut sink)
    }

    /// Drive an output pin to 0/1.
    pub fn write_pin(&self, pin: u8, value: u8) -> Result<PinSnapshot> {
        self.stats.record_op();
        let mut sink = self.notifier.clone();
        self.lock_registry().write(pin, value, &mut sink)
    }

    /// Sample an input pin.
    pub fn read_pin(&self, pin: u8) -> Result<PinSnapshot> {
        self.stats.record_op();
        self.lock_registry().read(pin)
    }

    /// Update a PWM pin's duty cycle, and optionally its frequency.
    pub fn set_pwm(&self, pin: u8, duty_cycle: f32, frequency_hz: Option<u32>) -> Result<PinSnapshot> {
        self.stats.record_op();
        let mut sink = self.notifier.clone();
        self.lock_registry().set_pwm(pin, duty_cycle, frequency_hz, &mut sink)
    }

    /// Release one pin. Idempotent: acknowledges even when unconfigured.
    pub fn delete_pin(&self, pin: u8) {
        self.stats.record_op();
        let mut sink = self.notifier.clone();
        self.lock_registry().release(pin, &mut sink);
    }

    /// Release every configured pin, returning how many were released.
    pub fn delete_all_pins(&self) -> usize {
        self.stats.record_op();
        let mut sink = self.notifier.clone();
        self.lock_registry().release_all(&mut sink)
    }

    // ── Monitoring ────────────────────────────────────────────

    /// Start background monitoring of `pins`, replacing any running
    /// session (last subscribe wins; the superseded stream ends silently).
    /// Returns the effective interval after defaulting and clamping.
    pub fn subscribe(&mut self, pin_set: &[u8], interval_ms: Option<u32>) -> Result<u32> {
        self.stats.record_op();
        if pin_set.is_empty() {
            return Err(Error::MissingParameter("pins"));
        }
        for &pin in pin_set {
            if pins::is_reserved(pin) {
                return Err(Error::Reserved(pin));
            }
            if !pins::is_safe(pin) {
                return Err(Error::InvalidPin(pin));
            }
        }
        let pins = heapless::Vec::<u8, MAX_MONITORED_PINS>::from_slice(pin_set)
            .map_err(|()| Error::Range("too many pins to monitor"))?;

        let interval_ms = interval_ms
            .unwrap_or(self.config.monitor_default_interval_ms)
            .max(self.config.monitor_min_interval_ms);

        self.monitor.start(
            self.registry.clone(),
            self.notifier.clone(),
            MonitorSpec { pins, interval_ms },
        );
        Ok(interval_ms)
    }

    /// Stop background monitoring. No-op when idle.
    pub fn unsubscribe(&mut self) {
        self.stats.record_op();
        self.monitor.stop();
    }

    /// True while a monitoring session is active.
    pub fn monitor_active(&self) -> bool {
        self.monitor.is_running()
    }

    // ── Transport dispatch ────────────────────────────────────

    /// Execute one typed command from a front-end adapter.
    pub fn handle_command(&mut self, cmd: PinCommand) -> Result<CommandReply> {
        match cmd {
            PinCommand::ListPins => Ok(CommandReply::Pins(self.list_pins())),
            PinCommand::GetPin { pin } => self.get_pin(pin).map(CommandReply::Snapshot),
            PinCommand::ConfigurePin(req) => {
                self.configure_pin(&req).map(CommandReply::Snapshot)
            }
            PinCommand::WritePin { pin, value } => {
                self.write_pin(pin, value).map(CommandReply::Snapshot)
            }
            PinCommand::ReadPin { pin } => self.read_pin(pin).map(CommandReply::Snapshot),
            PinCommand::SetPwm {
                pin,
                duty_cycle,
                frequency,
            } => self.set_pwm(pin, duty_cycle, frequency).map(CommandReply::Snapshot),
            PinCommand::DeletePin { pin } => {
                self.delete_pin(pin);
                Ok(CommandReply::Deleted { pin })
            }
            PinCommand::DeleteAllPins => {
                let count = self.delete_all_pins();
                Ok(CommandReply::AllDeleted { count })
            }
            PinCommand::Subscribe { pins, interval_ms } => {
                let effective = self.subscribe(&pins, interval_ms)?;
                Ok(CommandReply::Subscribed {
                    pins,
                    interval_ms: effective,
                })
            }
            PinCommand::Unsubscribe => {
                self.unsubscribe();
                Ok(CommandReply::Unsubscribed)
            }
            PinCommand::Health => Ok(CommandReply::Health(self.health())),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Orderly teardown: stop the monitor, then release every pin.
    pub fn shutdown(&mut self) {
        info!("service: shutting down");
        self.monitor.stop();
        self.delete_all_pins();
    }

    // ── Internal ──────────────────────────────────────────────

    fn lock_registry(&self) -> MutexGuard<'_, PinRegistry<A>> {
        // The registry never holds invalid intermediate state across a
        // panic (mutations complete or roll back), so a poisoned lock is
        // recoverable.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
