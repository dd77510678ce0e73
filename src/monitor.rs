//! Background pin monitoring.
//!
//! [`PinMonitor`] owns at most one sampling thread, spawned through
//! [`task_pin`](crate::drivers::task_pin) so it lands on the application
//! core on the device. Each tick takes the registry lock once, samples the
//! subscribed set (a fresh hardware read for inputs, the cached snapshot
//! otherwise), and publishes one [`MonitorBatch`] through the notifier.
//!
//! ## Cancellation
//!
//! Cooperative: the loop checks an [`AtomicBool`] once per iteration, so
//! the worst-case latency between a stop request and the thread exiting is
//! one polling interval. [`start`](PinMonitor::start) on a running monitor
//! performs that stop (and joins) before spawning the replacement —
//! exactly one monitor is ever active, and the last subscription wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::adapters::time::MonotonicClock;
use crate::app::events::{MonitorBatch, PinEvent};
use crate::app::ports::{EventSink, GpioPort};
use crate::notifier::ChangeNotifier;
use crate::pins::MAX_MONITORED_PINS;
use crate::registry::{PinMode, PinRegistry, PinSnapshot};

/// The subscribed pin set and cadence of one monitoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSpec {
    pub pins: heapless::Vec<u8, MAX_MONITORED_PINS>,
    pub interval_ms: u32,
}

/// Handle to the (at most one) background sampling thread.
pub struct PinMonitor {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    active: Option<MonitorSpec>,
}

impl PinMonitor {
    pub fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            handle: None,
            active: None,
        }
    }

    /// Start monitoring `spec.pins`, replacing any running session first.
    pub fn start<A>(
        &mut self,
        registry: Arc<Mutex<PinRegistry<A>>>,
        notifier: ChangeNotifier,
        spec: MonitorSpec,
    ) where
        A: GpioPort + Send + 'static,
    {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = cancel.clone();
        let interval = Duration::from_millis(u64::from(spec.interval_ms));
        let pins = spec.pins.clone();
        info!(
            "monitor: starting ({} pins, every {} ms)",
            pins.len(),
            spec.interval_ms
        );

        self.handle = Some(crate::drivers::task_pin::spawn_on_core(
            crate::drivers::task_pin::Core::App,
            5,
            8,
            "pin-mon\0",
            move || run_loop(&registry, notifier, &pins, interval, &cancel),
        ));
        self.active = Some(spec);
    }

    /// Request cancellation and wait for the thread to exit (bounded by
    /// one interval). No-op when idle.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("monitor: sampling thread panicked");
            }
            info!("monitor: stopped");
        }
        self.active = None;
    }

    /// True while a sampling thread is running.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// The active subscription, if any.
    pub fn active_spec(&self) -> Option<&MonitorSpec> {
        self.active.as_ref()
    }
}

impl Default for PinMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PinMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Sampling loop ─────────────────────────────────────────────

fn run_loop<A: GpioPort>(
    registry: &Mutex<PinRegistry<A>>,
    mut notifier: ChangeNotifier,
    pins: &[u8],
    interval: Duration,
    cancel: &AtomicBool,
) {
    let clock = MonotonicClock::new();
    loop {
        if cancel.load(Ordering::Acquire) {
            break;
        }

        let readings = sample(registry, pins);
        if !readings.is_empty() {
            notifier.emit(&PinEvent::MonitorBatch(MonitorBatch {
                uptime_ms: clock.uptime_ms(),
                readings,
            }));
        }

        std::thread::sleep(interval);
    }
}

/// One pass over the subscribed set, under a single registry lock so the
/// batch is an atomic view. Unconfigured pins are omitted; a pin whose
/// hardware read fails is logged and omitted from this batch only.
fn sample<A: GpioPort>(registry: &Mutex<PinRegistry<A>>, pins: &[u8]) -> Vec<PinSnapshot> {
    let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
    let mut readings = Vec::with_capacity(pins.len());
    for &pin in pins {
        match reg.pin_info(pin) {
            None => {}
            Some(snap) if snap.mode == PinMode::Input => match reg.read(pin) {
                Ok(fresh) => readings.push(fresh),
                Err(e) => warn!("monitor: read of pin {pin} failed: {e}"),
            },
            Some(snap) => readings.push(snap),
        }
    }
    readings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_gpio::MockGpioAdapter;
    use crate::app::ports::NullEventSink;
    use crate::diagnostics::RuntimeStats;
    use crate::registry::ConfigureRequest;

    fn shared_registry() -> Arc<Mutex<PinRegistry<MockGpioAdapter>>> {
        Arc::new(Mutex::new(PinRegistry::new(MockGpioAdapter::new())))
    }

    fn spec(pins: &[u8], interval_ms: u32) -> MonitorSpec {
        MonitorSpec {
            pins: heapless::Vec::from_slice(pins).unwrap(),
            interval_ms,
        }
    }

    #[test]
    fn sample_omits_unconfigured_pins() {
        let registry = shared_registry();
        {
            let mut reg = registry.lock().unwrap();
            reg.configure(&ConfigureRequest::output(17, 1), &mut NullEventSink)
                .unwrap();
        }
        let readings = sample(&registry, &[17, 21]);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].pin, 17);
    }

    #[test]
    fn sample_takes_fresh_reads_for_inputs() {
        let registry = shared_registry();
        {
            let mut reg = registry.lock().unwrap();
            reg.configure(&ConfigureRequest::input(4), &mut NullEventSink)
                .unwrap();
            reg.adapter_mut().set_input_level(4, 1);
        }
        let readings = sample(&registry, &[4]);
        assert_eq!(readings[0].value, 1, "must resample, not echo the cache");
    }

    #[test]
    fn sample_omits_pins_whose_read_fails() {
        let registry = shared_registry();
        {
            let mut reg = registry.lock().unwrap();
            reg.configure(&ConfigureRequest::input(4), &mut NullEventSink)
                .unwrap();
            reg.configure(&ConfigureRequest::output(17, 0), &mut NullEventSink)
                .unwrap();
            reg.adapter_mut().fail_op("read");
        }
        let readings = sample(&registry, &[4, 17]);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].pin, 17);
    }

    #[test]
    fn stop_is_idempotent_and_bounded() {
        let registry = shared_registry();
        let stats = Arc::new(RuntimeStats::new());
        let notifier = ChangeNotifier::new(stats);
        let mut monitor = PinMonitor::new();
        monitor.start(registry, notifier, spec(&[17], 10));
        assert!(monitor.is_running());
        monitor.stop();
        assert!(!monitor.is_running());
        monitor.stop();
    }

    #[test]
    fn start_replaces_running_session() {
        let registry = shared_registry();
        let stats = Arc::new(RuntimeStats::new());
        let notifier = ChangeNotifier::new(stats);
        let mut monitor = PinMonitor::new();
        monitor.start(registry.clone(), notifier.clone(), spec(&[17], 10));
        monitor.start(registry, notifier, spec(&[4], 20));
        assert!(monitor.is_running());
        assert_eq!(monitor.active_spec().unwrap().pins.as_slice(), &[4]);
        assert_eq!(monitor.active_spec().unwrap().interval_ms, 20);
    }
}
