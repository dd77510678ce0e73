//! Pin-state registry — the canonical owner of every configured pin.
//!
//! [`PinRegistry`] tracks each pin's configured mode, drives the hardware
//! through an injected [`GpioPort`], and republishes every state change
//! through an [`EventSink`] supplied at the call site. It is the **sole
//! owner** of every `PinConfig` and of every hardware PWM handle; no other
//! component may hold one.
//!
//! ## Reconfiguration is destructive
//!
//! A pin's mode is immutable for the lifetime of its entry. Configuring a
//! pin that already has an entry always runs the complete release path for
//! the old mode — including stopping and releasing any PWM oscillator —
//! before the first hardware setup call for the new one, so no hardware
//! resource is ever claimed twice. If the new setup then fails, the pin ends
//! up unconfigured: callers observe either the full new configuration or
//! none at all.
//!
//! The registry itself is not synchronized; callers wrap it in the single
//! coarse lock owned by [`GpioService`](crate::app::service::GpioService).

use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::events::PinEvent;
use crate::app::ports::{EventSink, GpioPort};
use crate::error::{Error, Result};
use crate::{pins, safety};

// ───────────────────────────────────────────────────────────────
// Domain types
// ───────────────────────────────────────────────────────────────

/// Operating discipline of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    /// Senses an external level.
    Input,
    /// Drives a level.
    Output,
    /// Drives a periodic waveform with a controllable duty cycle.
    Pwm,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Pwm => write!(f, "pwm"),
        }
    }
}

/// Weak bias applied to an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullMode {
    #[default]
    None,
    Up,
    Down,
}

impl fmt::Display for PullMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Internal per-pin bookkeeping. One entry per configured pin.
#[derive(Debug, Clone, Copy)]
struct PinConfig {
    pin: u8,
    mode: PinMode,
    /// Last known digital level. Meaningless for PWM entries.
    value: u8,
    /// Input bias; `None` for outputs and PWM.
    pull: PullMode,
    pwm_frequency_hz: Option<u32>,
    pwm_duty_percent: Option<f32>,
}

/// Point-in-time view of one configured pin, returned by every operation
/// and carried in every published event. Field names match the client
/// protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinSnapshot {
    pub pin: u8,
    pub mode: PinMode,
    pub value: u8,
    pub pull: PullMode,
    pub is_reserved: bool,
    pub is_available: bool,
    #[serde(
        rename = "pwm_frequency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pwm_frequency_hz: Option<u32>,
    #[serde(
        rename = "pwm_duty_cycle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pwm_duty_percent: Option<f32>,
}

/// Parameters of a configure operation. Optional fields deserialize to
/// their defaults, so transport adapters can feed client JSON straight in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub pin: u8,
    pub mode: PinMode,
    /// Input bias. Ignored for outputs and PWM.
    #[serde(default)]
    pub pull: PullMode,
    /// Level driven immediately after an output claim.
    #[serde(default)]
    pub initial_value: u8,
    /// Required for PWM mode.
    #[serde(rename = "pwm_frequency", default)]
    pub pwm_frequency_hz: Option<u32>,
}

impl ConfigureRequest {
    /// Plain input with no bias.
    pub fn input(pin: u8) -> Self {
        Self {
            pin,
            mode: PinMode::Input,
            pull: PullMode::None,
            initial_value: 0,
            pwm_frequency_hz: None,
        }
    }

    /// Output driving `initial` after the claim.
    pub fn output(pin: u8, initial: u8) -> Self {
        Self {
            pin,
            mode: PinMode::Output,
            pull: PullMode::None,
            initial_value: initial,
            pwm_frequency_hz: None,
        }
    }

    /// PWM at `frequency_hz`, starting at 0 % duty.
    pub fn pwm(pin: u8, frequency_hz: u32) -> Self {
        Self {
            pin,
            mode: PinMode::Pwm,
            pull: PullMode::None,
            initial_value: 0,
            pwm_frequency_hz: Some(frequency_hz),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Stateful map of configured pins over an owned hardware adapter.
pub struct PinRegistry<A: GpioPort> {
    pins: BTreeMap<u8, PinConfig>,
    /// Live oscillator handles, keyed by pin. Invariant: `pwm` has an entry
    /// for `p` iff `pins[p].mode == Pwm`.
    pwm: BTreeMap<u8, A::Pwm>,
    adapter: A,
}

impl<A: GpioPort> PinRegistry<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            pins: BTreeMap::new(),
            pwm: BTreeMap::new(),
            adapter,
        }
    }

    // ── Mutating operations ───────────────────────────────────

    /// Configure a pin, destroying any previous configuration first.
    ///
    /// Publishes `Configured` on success. If an existing entry had to be
    /// torn down and the new hardware setup then fails, publishes
    /// `Released` so observers learn the pin went unconfigured.
    pub fn configure(
        &mut self,
        req: &ConfigureRequest,
        sink: &mut impl EventSink,
    ) -> Result<PinSnapshot> {
        safety::validate_configure(req.pin, req.mode, req.pwm_frequency_hz)?;
        if req.mode == PinMode::Output {
            safety::validate_level(req.initial_value)?;
        }

        // Mode changes are destructive, never incremental: fully release
        // the previous claim (oscillator included) before any new setup.
        let had_entry = self.release_entry(req.pin);

        let result = self.install(req);
        match result {
            Ok(snapshot) => {
                sink.emit(&PinEvent::Configured(snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                if had_entry {
                    sink.emit(&PinEvent::Released { pin: req.pin });
                }
                Err(e)
            }
        }
    }

    /// Drive an output pin and update the cached level.
    pub fn write(&mut self, pin: u8, value: u8, sink: &mut impl EventSink) -> Result<PinSnapshot> {
        let cfg = self.pins.get(&pin).ok_or(Error::NotFound(pin))?;
        if cfg.mode != PinMode::Output {
            return Err(Error::StateError {
                pin,
                mode: cfg.mode,
            });
        }
        safety::validate_level(value)?;

        self.adapter.write(pin, value)?;
        let cfg = self.pins.get_mut(&pin).ok_or(Error::NotFound(pin))?;
        cfg.value = value;
        let snapshot = Self::snapshot_of(cfg);
        sink.emit(&PinEvent::Changed(snapshot));
        Ok(snapshot)
    }

    /// Sample an input pin, refreshing the cached level.
    ///
    /// Does not publish: direct reads go only to their caller, and
    /// polling-driven reads are batched by the monitor.
    pub fn read(&mut self, pin: u8) -> Result<PinSnapshot> {
        let cfg = self.pins.get(&pin).ok_or(Error::NotFound(pin))?;
        if cfg.mode != PinMode::Input {
            return Err(Error::StateError {
                pin,
                mode: cfg.mode,
            });
        }

        let value = self.adapter.read(pin)?;
        let cfg = self.pins.get_mut(&pin).ok_or(Error::NotFound(pin))?;
        cfg.value = value;
        Ok(Self::snapshot_of(cfg))
    }

    /// Update a PWM pin's duty cycle, and optionally its frequency first.
    pub fn set_pwm(
        &mut self,
        pin: u8,
        duty: f32,
        frequency_hz: Option<u32>,
        sink: &mut impl EventSink,
    ) -> Result<PinSnapshot> {
        let cfg = self.pins.get(&pin).ok_or(Error::NotFound(pin))?;
        if cfg.mode != PinMode::Pwm {
            return Err(Error::StateError {
                pin,
                mode: cfg.mode,
            });
        }
        safety::validate_duty(duty)?;
        if let Some(f) = frequency_hz {
            safety::validate_frequency(f)?;
        }

        let handle = self
            .pwm
            .get_mut(&pin)
            .ok_or(Error::NotFound(pin))?;

        // Frequency first, so the new duty applies to the new period.
        if let Some(f) = frequency_hz {
            self.adapter.pwm_set_frequency(handle, f)?;
            if let Some(cfg) = self.pins.get_mut(&pin) {
                cfg.pwm_frequency_hz = Some(f);
            }
        }

        let handle = self
            .pwm
            .get_mut(&pin)
            .ok_or(Error::NotFound(pin))?;
        self.adapter.pwm_set_duty(handle, duty)?;

        let cfg = self.pins.get_mut(&pin).ok_or(Error::NotFound(pin))?;
        cfg.pwm_duty_percent = Some(duty);
        let snapshot = Self::snapshot_of(cfg);
        sink.emit(&PinEvent::Changed(snapshot));
        Ok(snapshot)
    }

    /// Release one pin. Idempotent: releasing an unconfigured pin is a
    /// no-op, not an error, and publishes nothing.
    pub fn release(&mut self, pin: u8, sink: &mut impl EventSink) {
        if self.release_entry(pin) {
            sink.emit(&PinEvent::Released { pin });
        }
    }

    /// Release every configured pin, returning how many were released.
    /// Individual adapter failures are logged and never abort the
    /// remaining releases.
    pub fn release_all(&mut self, sink: &mut impl EventSink) -> usize {
        let configured: Vec<u8> = self.pins.keys().copied().collect();
        let count = configured.len();
        for pin in configured {
            self.release_entry(pin);
        }
        if let Err(e) = self.adapter.release_all() {
            warn!("release_all: {e} (ignored)");
        }
        sink.emit(&PinEvent::AllReleased { count });
        count
    }

    // ── Read-only queries ─────────────────────────────────────

    /// Snapshot of one configured pin, or `None` if it has no entry.
    pub fn pin_info(&self, pin: u8) -> Option<PinSnapshot> {
        self.pins.get(&pin).map(Self::snapshot_of)
    }

    /// Snapshots of every configured pin, ordered by pin number.
    pub fn all_pins_info(&self) -> Vec<PinSnapshot> {
        self.pins.values().map(Self::snapshot_of).collect()
    }

    /// The board's configurable pin numbers, sorted.
    pub fn available_pins(&self) -> Vec<u8> {
        pins::SAFE_PINS.to_vec()
    }

    /// Number of configured pins.
    pub fn configured_count(&self) -> usize {
        self.pins.len()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Tear down a pin's hardware claim and map entry. Returns whether an
    /// entry existed. Adapter errors on this path are logged and swallowed
    /// so one stuck pin never blocks the rest of a cleanup.
    fn release_entry(&mut self, pin: u8) -> bool {
        if !self.pins.contains_key(&pin) {
            return false;
        }
        if let Some(mut handle) = self.pwm.remove(&pin) {
            if let Err(e) = self.adapter.pwm_stop(&mut handle) {
                warn!("pwm_stop on pin {pin}: {e} (ignored during release)");
            }
        }
        if let Err(e) = self.adapter.release(pin) {
            warn!("release of pin {pin}: {e} (ignored)");
        }
        self.pins.remove(&pin);
        true
    }

    /// Claim the hardware for a validated request and insert the entry.
    fn install(&mut self, req: &ConfigureRequest) -> Result<PinSnapshot> {
        let cfg = match req.mode {
            PinMode::Input => {
                self.adapter.setup_input(req.pin, req.pull)?;
                // Sample immediately so the first snapshot carries a real
                // level. A failed sample leaves the pin unconfigured.
                let value = match self.adapter.read(req.pin) {
                    Ok(v) => v,
                    Err(e) => {
                        if let Err(e2) = self.adapter.release(req.pin) {
                            warn!("release of pin {} after failed read: {e2} (ignored)", req.pin);
                        }
                        return Err(e.into());
                    }
                };
                PinConfig {
                    pin: req.pin,
                    mode: PinMode::Input,
                    value,
                    pull: req.pull,
                    pwm_frequency_hz: None,
                    pwm_duty_percent: None,
                }
            }
            PinMode::Output => {
                self.adapter.setup_output(req.pin, req.initial_value)?;
                PinConfig {
                    pin: req.pin,
                    mode: PinMode::Output,
                    value: req.initial_value,
                    pull: PullMode::None,
                    pwm_frequency_hz: None,
                    pwm_duty_percent: None,
                }
            }
            PinMode::Pwm => {
                // Frequency presence/range was validated up front.
                let frequency_hz = req
                    .pwm_frequency_hz
                    .ok_or(Error::MissingParameter("pwm_frequency"))?;
                let handle = self.adapter.setup_pwm(req.pin, frequency_hz)?;
                self.pwm.insert(req.pin, handle);
                PinConfig {
                    pin: req.pin,
                    mode: PinMode::Pwm,
                    value: 0,
                    pull: PullMode::None,
                    pwm_frequency_hz: Some(frequency_hz),
                    pwm_duty_percent: Some(0.0),
                }
            }
        };

        let snapshot = Self::snapshot_of(&cfg);
        self.pins.insert(req.pin, cfg);
        Ok(snapshot)
    }

    fn snapshot_of(cfg: &PinConfig) -> PinSnapshot {
        PinSnapshot {
            pin: cfg.pin,
            mode: cfg.mode,
            value: cfg.value,
            pull: cfg.pull,
            is_reserved: pins::is_reserved(cfg.pin),
            is_available: safety::is_available(cfg.pin),
            pwm_frequency_hz: cfg.pwm_frequency_hz,
            pwm_duty_percent: cfg.pwm_duty_percent,
        }
    }

    /// Borrow the adapter (tests inspect mock state through this).
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutably borrow the adapter (tests inject input levels).
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_gpio::{MockCall, MockGpioAdapter};
    use crate::app::ports::NullEventSink;

    fn registry() -> PinRegistry<MockGpioAdapter> {
        PinRegistry::new(MockGpioAdapter::new())
    }

    #[test]
    fn configure_output_drives_initial_level() {
        let mut reg = registry();
        let snap = reg
            .configure(&ConfigureRequest::output(17, 1), &mut NullEventSink)
            .unwrap();
        assert_eq!(snap.mode, PinMode::Output);
        assert_eq!(snap.value, 1);
        assert!(snap.is_available);
        assert!(!snap.is_reserved);
    }

    #[test]
    fn configure_input_samples_current_level() {
        let mut reg = registry();
        reg.adapter_mut().set_input_level(4, 1);
        let snap = reg
            .configure(&ConfigureRequest::input(4), &mut NullEventSink)
            .unwrap();
        assert_eq!(snap.mode, PinMode::Input);
        assert_eq!(snap.value, 1);
    }

    #[test]
    fn write_requires_output_mode() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::input(4), &mut NullEventSink)
            .unwrap();
        assert_eq!(
            reg.write(4, 1, &mut NullEventSink),
            Err(Error::StateError {
                pin: 4,
                mode: PinMode::Input
            })
        );
    }

    #[test]
    fn read_requires_input_mode() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::output(17, 0), &mut NullEventSink)
            .unwrap();
        assert_eq!(
            reg.read(17),
            Err(Error::StateError {
                pin: 17,
                mode: PinMode::Output
            })
        );
    }

    #[test]
    fn write_rejects_non_binary_levels() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::output(17, 0), &mut NullEventSink)
            .unwrap();
        assert_eq!(
            reg.write(17, 2, &mut NullEventSink),
            Err(Error::Range("digital level must be 0 or 1"))
        );
    }

    #[test]
    fn unconfigured_pin_is_not_found() {
        let mut reg = registry();
        assert_eq!(reg.write(17, 1, &mut NullEventSink), Err(Error::NotFound(17)));
        assert_eq!(reg.read(17), Err(Error::NotFound(17)));
        assert_eq!(
            reg.set_pwm(17, 50.0, None, &mut NullEventSink),
            Err(Error::NotFound(17))
        );
    }

    #[test]
    fn pwm_starts_at_zero_duty() {
        let mut reg = registry();
        let snap = reg
            .configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();
        assert_eq!(snap.pwm_frequency_hz, Some(1000));
        assert_eq!(snap.pwm_duty_percent, Some(0.0));
        assert_eq!(reg.adapter().pwm_duty(18), Some(0.0));
    }

    #[test]
    fn set_pwm_applies_frequency_before_duty() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();
        let snap = reg
            .set_pwm(18, 75.0, Some(2000), &mut NullEventSink)
            .unwrap();
        assert_eq!(snap.pwm_frequency_hz, Some(2000));
        assert_eq!(snap.pwm_duty_percent, Some(75.0));

        let calls = reg.adapter().calls();
        let freq_idx = calls
            .iter()
            .position(|c| matches!(c, MockCall::PwmSetFrequency { pin: 18, .. }))
            .unwrap();
        let duty_idx = calls
            .iter()
            .rposition(|c| matches!(c, MockCall::PwmSetDuty { pin: 18, .. }))
            .unwrap();
        assert!(freq_idx < duty_idx, "frequency must be applied before duty");
    }

    #[test]
    fn set_pwm_rejects_out_of_range_duty() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();
        assert_eq!(
            reg.set_pwm(18, 150.0, None, &mut NullEventSink),
            Err(Error::Range("duty cycle must be 0-100"))
        );
        // Cached state untouched by the failed call.
        assert_eq!(reg.pin_info(18).unwrap().pwm_duty_percent, Some(0.0));
    }

    #[test]
    fn reconfigure_releases_before_claiming() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::output(18, 0), &mut NullEventSink)
            .unwrap();
        reg.configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();

        let calls = reg.adapter().calls();
        let release_idx = calls
            .iter()
            .position(|c| matches!(c, MockCall::Release { pin: 18 }))
            .unwrap();
        let pwm_idx = calls
            .iter()
            .position(|c| matches!(c, MockCall::SetupPwm { pin: 18, .. }))
            .unwrap();
        assert!(release_idx < pwm_idx, "old claim must be released first");
        assert_eq!(reg.adapter().claim_count(), 1);
    }

    #[test]
    fn reconfigure_stops_oscillator_before_new_claim() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();
        reg.configure(&ConfigureRequest::output(18, 1), &mut NullEventSink)
            .unwrap();
        // Third reconfiguration: no dangling oscillator may survive.
        reg.configure(&ConfigureRequest::input(18), &mut NullEventSink)
            .unwrap();
        assert_eq!(reg.adapter().live_pwm_count(), 0);
        assert_eq!(reg.adapter().claim_count(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::output(17, 0), &mut NullEventSink)
            .unwrap();
        reg.release(17, &mut NullEventSink);
        reg.release(17, &mut NullEventSink);
        assert!(reg.pin_info(17).is_none());
        assert_eq!(reg.adapter().claim_count(), 0);
    }

    #[test]
    fn release_all_survives_adapter_failures() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::output(17, 0), &mut NullEventSink)
            .unwrap();
        reg.configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();
        reg.configure(&ConfigureRequest::input(4), &mut NullEventSink)
            .unwrap();

        reg.adapter_mut().fail_op("release");
        reg.release_all(&mut NullEventSink);
        assert_eq!(reg.configured_count(), 0);
        assert_eq!(reg.adapter().live_pwm_count(), 0);
    }

    #[test]
    fn failed_setup_leaves_pin_unconfigured() {
        let mut reg = registry();
        reg.configure(&ConfigureRequest::output(17, 0), &mut NullEventSink)
            .unwrap();
        reg.adapter_mut().fail_op("setup_pwm");
        let err = reg
            .configure(&ConfigureRequest::pwm(17, 1000), &mut NullEventSink)
            .unwrap_err();
        assert_eq!(err.code(), "adapter_error");
        assert!(reg.pin_info(17).is_none(), "pin must end up unconfigured");
        assert_eq!(reg.adapter().claim_count(), 0);
    }

    #[test]
    fn all_pins_info_is_ordered() {
        let mut reg = registry();
        for pin in [21, 4, 17] {
            reg.configure(&ConfigureRequest::output(pin, 0), &mut NullEventSink)
                .unwrap();
        }
        let pins: Vec<u8> = reg.all_pins_info().iter().map(|s| s.pin).collect();
        assert_eq!(pins, vec![4, 17, 21]);
    }

    #[test]
    fn snapshot_wire_format_matches_protocol() {
        let mut reg = registry();
        let snap = reg
            .configure(&ConfigureRequest::pwm(18, 1000), &mut NullEventSink)
            .unwrap();
        let json = serde_json::to_value(snap).unwrap();
        assert_eq!(json["mode"], "pwm");
        assert_eq!(json["pwm_frequency"], 1000);
        assert_eq!(json["pwm_duty_cycle"], 0.0);

        let snap = reg
            .configure(&ConfigureRequest::input(4), &mut NullEventSink)
            .unwrap();
        let json = serde_json::to_value(snap).unwrap();
        assert_eq!(json["mode"], "input");
        assert_eq!(json["pull"], "none");
        assert!(json.get("pwm_frequency").is_none());
    }
}
