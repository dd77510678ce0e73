//! Safety validation rules.
//!
//! Pure checks over pin identity, mode, and parameters, consumed by the
//! registry **before any hardware call**. No state, no side effects — a
//! request that passes this module is electrically safe to hand to the
//! adapter; a request that fails it never reaches hardware.
//!
//! Check order for `validate_configure` is deliberate: reservation first
//! (the strongest claim the board makes on a pin), then safe-set
//! membership, then per-mode parameters.

use crate::error::{Error, Result};
use crate::pins;
use crate::registry::PinMode;

/// True iff `pin` may be configured at all: a member of the safe set and
/// not claimed by a fixed board function.
pub fn is_available(pin: u8) -> bool {
    pins::is_safe(pin) && !pins::is_reserved(pin)
}

/// Validate a configure request before the registry touches hardware.
pub fn validate_configure(pin: u8, mode: PinMode, pwm_frequency_hz: Option<u32>) -> Result<()> {
    if pins::is_reserved(pin) {
        return Err(Error::Reserved(pin));
    }
    if !pins::is_safe(pin) {
        return Err(Error::InvalidPin(pin));
    }
    if mode == PinMode::Pwm {
        match pwm_frequency_hz {
            None => return Err(Error::MissingParameter("pwm_frequency")),
            Some(f) => validate_frequency(f)?,
        }
    }
    Ok(())
}

/// A PWM frequency must be positive and below the LEDC ceiling.
pub fn validate_frequency(frequency_hz: u32) -> Result<()> {
    if frequency_hz == 0 {
        return Err(Error::Range("pwm frequency must be > 0"));
    }
    if frequency_hz > pins::PWM_MAX_FREQUENCY_HZ {
        return Err(Error::Range("pwm frequency exceeds LEDC ceiling"));
    }
    Ok(())
}

/// A duty cycle is a percentage.
pub fn validate_duty(duty: f32) -> Result<()> {
    if !(0.0..=100.0).contains(&duty) || duty.is_nan() {
        return Err(Error::Range("duty cycle must be 0-100"));
    }
    Ok(())
}

/// Digital levels are strictly binary.
pub fn validate_level(value: u8) -> Result<()> {
    if value > 1 {
        return Err(Error::Range("digital level must be 0 or 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_pins_never_available() {
        for pin in pins::RESERVED_PINS {
            assert!(!is_available(pin));
            assert_eq!(
                validate_configure(pin, PinMode::Output, None),
                Err(Error::Reserved(pin))
            );
            // Reservation wins over any mode, including PWM with params.
            assert_eq!(
                validate_configure(pin, PinMode::Pwm, Some(1000)),
                Err(Error::Reserved(pin))
            );
        }
    }

    #[test]
    fn unknown_pins_are_invalid() {
        assert_eq!(
            validate_configure(0, PinMode::Input, None),
            Err(Error::InvalidPin(0))
        );
        assert_eq!(
            validate_configure(28, PinMode::Output, None),
            Err(Error::InvalidPin(28))
        );
    }

    #[test]
    fn pwm_requires_frequency() {
        assert_eq!(
            validate_configure(18, PinMode::Pwm, None),
            Err(Error::MissingParameter("pwm_frequency"))
        );
        assert!(validate_configure(18, PinMode::Pwm, Some(1000)).is_ok());
    }

    #[test]
    fn frequency_bounds() {
        assert!(validate_frequency(0).is_err());
        assert!(validate_frequency(1).is_ok());
        assert!(validate_frequency(pins::PWM_MAX_FREQUENCY_HZ).is_ok());
        assert!(validate_frequency(pins::PWM_MAX_FREQUENCY_HZ + 1).is_err());
    }

    #[test]
    fn duty_bounds() {
        assert!(validate_duty(0.0).is_ok());
        assert!(validate_duty(100.0).is_ok());
        assert!(validate_duty(-0.1).is_err());
        assert!(validate_duty(100.1).is_err());
        assert!(validate_duty(f32::NAN).is_err());
    }

    #[test]
    fn levels_are_binary() {
        assert!(validate_level(0).is_ok());
        assert!(validate_level(1).is_ok());
        assert!(validate_level(2).is_err());
    }
}
