//! Port traits — the hexagonal boundary between the pin-state core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PinRegistry / GpioService (domain)
//! ```
//!
//! Driven adapters (the real GPIO peripheral driver, the deterministic mock,
//! event sinks) implement these traits. The domain consumes them via
//! generics, so the registry never touches hardware directly and the whole
//! core is exercised on the host with the mock.

use crate::app::events::PinEvent;
use crate::error::AdapterError;
use crate::registry::PullMode;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → pin hardware)
// ───────────────────────────────────────────────────────────────

/// Capability interface to the physical pin driver.
///
/// One implementation drives real silicon
/// ([`EspGpioAdapter`](crate::adapters::esp_gpio)); one is a deterministic
/// in-memory mock ([`MockGpioAdapter`](crate::adapters::mock_gpio::MockGpioAdapter))
/// for hosts without the hardware. The registry selects one at construction —
/// the core never inspects the runtime platform itself.
///
/// ## Handle ownership
///
/// `setup_pwm` starts the oscillator at 0 % duty and hands back an opaque
/// handle. The registry is the sole owner of every handle and must pass it
/// to `pwm_stop` before `release` on every teardown path, or the oscillator
/// resource leaks.
pub trait GpioPort {
    /// Opaque per-pin PWM oscillator handle. `Send` because the registry
    /// that owns handles is shared with the monitor thread.
    type Pwm: Send;

    /// Claim `pin` as a digital input with the given pull bias.
    fn setup_input(&mut self, pin: u8, pull: PullMode) -> Result<(), AdapterError>;

    /// Claim `pin` as a digital output driving `initial` (0/1).
    fn setup_output(&mut self, pin: u8, initial: u8) -> Result<(), AdapterError>;

    /// Claim `pin` as a PWM output at `frequency_hz`, oscillator running at
    /// 0 % duty.
    fn setup_pwm(&mut self, pin: u8, frequency_hz: u32) -> Result<Self::Pwm, AdapterError>;

    /// Drive an output pin to `value` (0/1).
    fn write(&mut self, pin: u8, value: u8) -> Result<(), AdapterError>;

    /// Sample the current level of an input pin.
    fn read(&mut self, pin: u8) -> Result<u8, AdapterError>;

    /// Change the duty cycle (0–100) of a running oscillator.
    fn pwm_set_duty(&mut self, handle: &mut Self::Pwm, duty: f32) -> Result<(), AdapterError>;

    /// Change the frequency of a running oscillator.
    fn pwm_set_frequency(
        &mut self,
        handle: &mut Self::Pwm,
        frequency_hz: u32,
    ) -> Result<(), AdapterError>;

    /// Stop the oscillator. The handle is dead afterwards; follow with
    /// [`release`](Self::release).
    fn pwm_stop(&mut self, handle: &mut Self::Pwm) -> Result<(), AdapterError>;

    /// Return `pin` to its unclaimed reset state.
    fn release(&mut self, pin: u8) -> Result<(), AdapterError>;

    /// Return every claimed pin to its reset state.
    fn release_all(&mut self) -> Result<(), AdapterError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → observers)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`PinEvent`]s through this port.
/// Adapters decide where they go — serial log, an RPC push channel, the
/// on-device display. Delivery is fire-and-forget: no queueing, no
/// backpressure, no guarantee.
pub trait EventSink {
    fn emit(&mut self, event: &PinEvent);
}

/// Sink that discards every event. Useful where a caller has no observers
/// to notify (and in tests that don't assert on events).
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: &PinEvent) {}
}
