//! Deterministic in-memory GPIO adapter.
//!
//! Implements [`GpioPort`] without touching hardware: reads echo the last
//! written level (or an injected input level), and every call is recorded.
//! Used wherever the real peripheral is absent — host-target tests, CI,
//! and desktop bring-up of the front-ends.
//!
//! The mock also enforces the adapter contract the silicon would: claiming
//! an already-claimed pin, or operating an unclaimed one, is an
//! [`AdapterError`]. Tests lean on this to prove the registry never
//! double-claims a pin and never leaks an oscillator.

use std::collections::{BTreeMap, BTreeSet};

use crate::app::ports::GpioPort;
use crate::error::AdapterError;
use crate::registry::PullMode;

/// Synthetic return codes, in the spirit of `esp_err_t`.
const RC_FORCED: i32 = -1;
const RC_DOUBLE_CLAIM: i32 = -2;
const RC_UNCLAIMED: i32 = -3;

/// One recorded adapter invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockCall {
    SetupInput { pin: u8, pull: PullMode },
    SetupOutput { pin: u8, initial: u8 },
    SetupPwm { pin: u8, frequency_hz: u32 },
    Write { pin: u8, value: u8 },
    Read { pin: u8 },
    PwmSetDuty { pin: u8, duty: f32 },
    PwmSetFrequency { pin: u8, frequency_hz: u32 },
    PwmStop { pin: u8 },
    Release { pin: u8 },
    ReleaseAll,
}

/// Opaque oscillator handle handed to the registry.
#[derive(Debug)]
pub struct MockPwm {
    pin: u8,
}

/// Deterministic [`GpioPort`] implementation.
pub struct MockGpioAdapter {
    claims: BTreeSet<u8>,
    /// Last written level per output pin.
    levels: BTreeMap<u8, u8>,
    /// Externally injected level per input pin (defaults to 0).
    input_levels: BTreeMap<u8, u8>,
    pwm_duty: BTreeMap<u8, f32>,
    pwm_frequency: BTreeMap<u8, u32>,
    /// Pins with a live (started, not yet stopped) oscillator.
    pwm_running: BTreeSet<u8>,
    calls: Vec<MockCall>,
    /// Operation names forced to fail (persistent until cleared).
    fail_ops: BTreeSet<&'static str>,
}

impl MockGpioAdapter {
    pub fn new() -> Self {
        Self {
            claims: BTreeSet::new(),
            levels: BTreeMap::new(),
            input_levels: BTreeMap::new(),
            pwm_duty: BTreeMap::new(),
            pwm_frequency: BTreeMap::new(),
            pwm_running: BTreeSet::new(),
            calls: Vec::new(),
            fail_ops: BTreeSet::new(),
        }
    }

    // ── Test instrumentation ──────────────────────────────────

    /// Simulate an external level driving an input pin.
    pub fn set_input_level(&mut self, pin: u8, level: u8) {
        self.input_levels.insert(pin, level);
    }

    /// Force every future call of `op` to fail with a synthetic code.
    pub fn fail_op(&mut self, op: &'static str) {
        self.fail_ops.insert(op);
    }

    /// Stop forcing failures.
    pub fn clear_failures(&mut self) {
        self.fail_ops.clear();
    }

    /// Every adapter invocation so far, in order.
    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    /// Number of currently claimed pins.
    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// Number of oscillators started but not yet stopped.
    pub fn live_pwm_count(&self) -> usize {
        self.pwm_running.len()
    }

    /// Current duty of a live oscillator.
    pub fn pwm_duty(&self, pin: u8) -> Option<f32> {
        self.pwm_duty.get(&pin).copied()
    }

    /// Current frequency of a live oscillator.
    pub fn pwm_frequency(&self, pin: u8) -> Option<u32> {
        self.pwm_frequency.get(&pin).copied()
    }

    /// Last level written to an output pin.
    pub fn output_level(&self, pin: u8) -> Option<u8> {
        self.levels.get(&pin).copied()
    }

    // ── Internal ──────────────────────────────────────────────

    fn check(&self, op: &'static str) -> Result<(), AdapterError> {
        if self.fail_ops.contains(op) {
            return Err(AdapterError::new(op, RC_FORCED));
        }
        Ok(())
    }

    fn claim(&mut self, op: &'static str, pin: u8) -> Result<(), AdapterError> {
        if !self.claims.insert(pin) {
            return Err(AdapterError::new(op, RC_DOUBLE_CLAIM));
        }
        Ok(())
    }
}

impl Default for MockGpioAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for MockGpioAdapter {
    type Pwm = MockPwm;

    fn setup_input(&mut self, pin: u8, pull: PullMode) -> Result<(), AdapterError> {
        self.calls.push(MockCall::SetupInput { pin, pull });
        self.check("setup_input")?;
        self.claim("setup_input", pin)
    }

    fn setup_output(&mut self, pin: u8, initial: u8) -> Result<(), AdapterError> {
        self.calls.push(MockCall::SetupOutput { pin, initial });
        self.check("setup_output")?;
        self.claim("setup_output", pin)?;
        self.levels.insert(pin, initial);
        Ok(())
    }

    fn setup_pwm(&mut self, pin: u8, frequency_hz: u32) -> Result<MockPwm, AdapterError> {
        self.calls.push(MockCall::SetupPwm { pin, frequency_hz });
        self.check("setup_pwm")?;
        self.claim("setup_pwm", pin)?;
        self.pwm_frequency.insert(pin, frequency_hz);
        self.pwm_duty.insert(pin, 0.0);
        self.pwm_running.insert(pin);
        Ok(MockPwm { pin })
    }

    fn write(&mut self, pin: u8, value: u8) -> Result<(), AdapterError> {
        self.calls.push(MockCall::Write { pin, value });
        self.check("write")?;
        if !self.claims.contains(&pin) {
            return Err(AdapterError::new("write", RC_UNCLAIMED));
        }
        self.levels.insert(pin, value);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<u8, AdapterError> {
        self.calls.push(MockCall::Read { pin });
        self.check("read")?;
        if !self.claims.contains(&pin) {
            return Err(AdapterError::new("read", RC_UNCLAIMED));
        }
        // Outputs echo the last written level; inputs echo the injected
        // external level, defaulting to low.
        if let Some(&level) = self.levels.get(&pin) {
            return Ok(level);
        }
        Ok(self.input_levels.get(&pin).copied().unwrap_or(0))
    }

    fn pwm_set_duty(&mut self, handle: &mut MockPwm, duty: f32) -> Result<(), AdapterError> {
        self.calls.push(MockCall::PwmSetDuty {
            pin: handle.pin,
            duty,
        });
        self.check("pwm_set_duty")?;
        if !self.pwm_running.contains(&handle.pin) {
            return Err(AdapterError::new("pwm_set_duty", RC_UNCLAIMED));
        }
        self.pwm_duty.insert(handle.pin, duty);
        Ok(())
    }

    fn pwm_set_frequency(
        &mut self,
        handle: &mut MockPwm,
        frequency_hz: u32,
    ) -> Result<(), AdapterError> {
        self.calls.push(MockCall::PwmSetFrequency {
            pin: handle.pin,
            frequency_hz,
        });
        self.check("pwm_set_frequency")?;
        if !self.pwm_running.contains(&handle.pin) {
            return Err(AdapterError::new("pwm_set_frequency", RC_UNCLAIMED));
        }
        self.pwm_frequency.insert(handle.pin, frequency_hz);
        Ok(())
    }

    fn pwm_stop(&mut self, handle: &mut MockPwm) -> Result<(), AdapterError> {
        self.calls.push(MockCall::PwmStop { pin: handle.pin });
        self.check("pwm_stop")?;
        self.pwm_running.remove(&handle.pin);
        self.pwm_duty.remove(&handle.pin);
        self.pwm_frequency.remove(&handle.pin);
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), AdapterError> {
        self.calls.push(MockCall::Release { pin });
        self.check("release")?;
        self.claims.remove(&pin);
        self.levels.remove(&pin);
        // A release without a prior pwm_stop would leak the oscillator;
        // leave pwm_running untouched so tests can see the leak.
        Ok(())
    }

    fn release_all(&mut self) -> Result<(), AdapterError> {
        self.calls.push(MockCall::ReleaseAll);
        self.check("release_all")?;
        self.claims.clear();
        self.levels.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_echoes_last_written_level() {
        let mut mock = MockGpioAdapter::new();
        mock.setup_output(17, 0).unwrap();
        mock.write(17, 1).unwrap();
        assert_eq!(mock.read(17).unwrap(), 1);
        mock.write(17, 0).unwrap();
        assert_eq!(mock.read(17).unwrap(), 0);
    }

    #[test]
    fn input_reads_injected_level_default_low() {
        let mut mock = MockGpioAdapter::new();
        mock.setup_input(4, PullMode::Up).unwrap();
        assert_eq!(mock.read(4).unwrap(), 0);
        mock.set_input_level(4, 1);
        assert_eq!(mock.read(4).unwrap(), 1);
    }

    #[test]
    fn double_claim_is_an_error() {
        let mut mock = MockGpioAdapter::new();
        mock.setup_output(17, 0).unwrap();
        let err = mock.setup_input(17, PullMode::None).unwrap_err();
        assert_eq!(err.code, RC_DOUBLE_CLAIM);
    }

    #[test]
    fn unclaimed_pin_operations_fail() {
        let mut mock = MockGpioAdapter::new();
        assert!(mock.write(17, 1).is_err());
        assert!(mock.read(17).is_err());
    }

    #[test]
    fn release_without_stop_leaks_oscillator() {
        let mut mock = MockGpioAdapter::new();
        let _handle = mock.setup_pwm(18, 1000).unwrap();
        mock.release(18).unwrap();
        assert_eq!(mock.live_pwm_count(), 1, "leak must remain visible");
    }

    #[test]
    fn stop_then_release_leaves_nothing_live() {
        let mut mock = MockGpioAdapter::new();
        let mut handle = mock.setup_pwm(18, 1000).unwrap();
        mock.pwm_stop(&mut handle).unwrap();
        mock.release(18).unwrap();
        assert_eq!(mock.live_pwm_count(), 0);
        assert_eq!(mock.claim_count(), 0);
    }
}
