//! Real GPIO adapter for the ESP32-S3.
//!
//! Implements [`GpioPort`] against ESP-IDF: digital lines through
//! `esp-idf-hal` pin drivers, PWM through the LEDC peripheral via raw sys
//! calls. This is the only module in the system that touches actual pin
//! hardware.
//!
//! ## LEDC slots
//!
//! Every PWM pin needs its own frequency, and an LEDC timer can serve only
//! one frequency, so each oscillator claims a (channel, timer) slot pair.
//! The SoC has four low-speed timers — at most four concurrent PWM pins;
//! a fifth `setup_pwm` fails with `ESP_ERR_NOT_FOUND`.
//!
//! Duty resolution shrinks as frequency grows (LEDC constraint:
//! `freq * 2^bits <= 80 MHz`), so the bit width is derived per frequency
//! and the percentage duty is rescaled on every change.

#![cfg(target_os = "espidf")]

use std::collections::BTreeMap;

use esp_idf_hal::gpio::{AnyIOPin, Input, Level, Output, PinDriver, Pull};
use esp_idf_svc::sys::{self as sys, EspError};
use log::info;

use crate::app::ports::GpioPort;
use crate::error::AdapterError;
use crate::registry::PullMode;

/// LEDC source clock (APB).
const LEDC_CLK_HZ: u32 = 80_000_000;
/// Concurrent PWM pins — one low-speed timer each.
const LEDC_SLOTS: usize = 4;
/// Finest duty resolution worth configuring.
const LEDC_MAX_BITS: u32 = 10;

/// A claimed digital line.
enum Line {
    Input(PinDriver<'static, AnyIOPin, Input>),
    Output(PinDriver<'static, AnyIOPin, Output>),
}

/// Live LEDC oscillator handle. Owned by the registry; dies with the pin
/// entry.
pub struct LedcPwm {
    pin: u8,
    slot: usize,
    bits: u32,
    duty_percent: f32,
}

/// [`GpioPort`] implementation over ESP-IDF.
pub struct EspGpioAdapter {
    lines: BTreeMap<u8, Line>,
    slot_used: [bool; LEDC_SLOTS],
}

impl EspGpioAdapter {
    pub fn new() -> Self {
        info!("gpio: ESP32-S3 adapter ready ({LEDC_SLOTS} PWM slots)");
        Self {
            lines: BTreeMap::new(),
            slot_used: [false; LEDC_SLOTS],
        }
    }

    fn wrap(op: &'static str, r: Result<(), EspError>) -> Result<(), AdapterError> {
        r.map_err(|e| AdapterError::new(op, e.code()))
    }

    fn esp(op: &'static str, rc: i32) -> Result<(), AdapterError> {
        if rc == sys::ESP_OK as i32 {
            Ok(())
        } else {
            Err(AdapterError::new(op, rc))
        }
    }

    /// Widest duty resolution the LEDC clock allows at `freq`.
    fn duty_bits(freq: u32) -> u32 {
        let ratio = LEDC_CLK_HZ / freq.max(1);
        let bits = 31 - ratio.max(2).leading_zeros();
        bits.clamp(1, LEDC_MAX_BITS)
    }

    fn duty_ticks(duty_percent: f32, bits: u32) -> u32 {
        let max = (1u32 << bits) - 1;
        ((duty_percent / 100.0) * max as f32).round() as u32
    }

    /// (Re)program the timer for `slot` and its channel binding for `pin`.
    fn program_slot(
        op: &'static str,
        pin: u8,
        slot: usize,
        freq: u32,
        bits: u32,
    ) -> Result<(), AdapterError> {
        let timer_cfg = sys::ledc_timer_config_t {
            speed_mode: sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: sys::ledc_timer_t_LEDC_TIMER_0 + slot as u32,
            duty_resolution: bits,
            freq_hz: freq,
            clk_cfg: sys::soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        // SAFETY: plain register configuration; the slot allocator guarantees
        // this timer/channel pair belongs to exactly one oscillator.
        Self::esp(op, unsafe { sys::ledc_timer_config(&timer_cfg) })?;

        let chan_cfg = sys::ledc_channel_config_t {
            speed_mode: sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: sys::ledc_channel_t_LEDC_CHANNEL_0 + slot as u32,
            timer_sel: sys::ledc_timer_t_LEDC_TIMER_0 + slot as u32,
            gpio_num: i32::from(pin),
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        // SAFETY: as above.
        Self::esp(op, unsafe { sys::ledc_channel_config(&chan_cfg) })
    }

    fn apply_duty(handle: &LedcPwm) -> Result<(), AdapterError> {
        let channel = sys::ledc_channel_t_LEDC_CHANNEL_0 + handle.slot as u32;
        let ticks = Self::duty_ticks(handle.duty_percent, handle.bits);
        // SAFETY: duty register writes on a channel configured in
        // program_slot(); serialized by the registry lock.
        unsafe {
            Self::esp(
                "pwm_set_duty",
                sys::ledc_set_duty(sys::ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, ticks),
            )?;
            Self::esp(
                "pwm_set_duty",
                sys::ledc_update_duty(sys::ledc_mode_t_LEDC_LOW_SPEED_MODE, channel),
            )
        }
    }
}

impl Default for EspGpioAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for EspGpioAdapter {
    type Pwm = LedcPwm;

    fn setup_input(&mut self, pin: u8, pull: PullMode) -> Result<(), AdapterError> {
        // SAFETY: the registry releases any previous claim on `pin` before
        // calling setup, so no other driver for this pin exists.
        let any = unsafe { AnyIOPin::new(i32::from(pin)) };
        let mut driver = PinDriver::input(any)
            .map_err(|e| AdapterError::new("setup_input", e.code()))?;
        let bias = match pull {
            PullMode::None => Pull::Floating,
            PullMode::Up => Pull::Up,
            PullMode::Down => Pull::Down,
        };
        Self::wrap("setup_input", driver.set_pull(bias))?;
        self.lines.insert(pin, Line::Input(driver));
        Ok(())
    }

    fn setup_output(&mut self, pin: u8, initial: u8) -> Result<(), AdapterError> {
        // SAFETY: exclusivity guaranteed by the registry, as above.
        let any = unsafe { AnyIOPin::new(i32::from(pin)) };
        let mut driver = PinDriver::output(any)
            .map_err(|e| AdapterError::new("setup_output", e.code()))?;
        let level = if initial == 1 { Level::High } else { Level::Low };
        Self::wrap("setup_output", driver.set_level(level))?;
        self.lines.insert(pin, Line::Output(driver));
        Ok(())
    }

    fn setup_pwm(&mut self, pin: u8, frequency_hz: u32) -> Result<LedcPwm, AdapterError> {
        let Some(slot) = self.slot_used.iter().position(|used| !used) else {
            return Err(AdapterError::new("setup_pwm", sys::ESP_ERR_NOT_FOUND as i32));
        };
        let bits = Self::duty_bits(frequency_hz);
        Self::program_slot("setup_pwm", pin, slot, frequency_hz, bits)?;
        self.slot_used[slot] = true;

        let handle = LedcPwm {
            pin,
            slot,
            bits,
            duty_percent: 0.0,
        };
        // Oscillator starts held low: 0 % duty.
        Self::apply_duty(&handle)?;
        Ok(handle)
    }

    fn write(&mut self, pin: u8, value: u8) -> Result<(), AdapterError> {
        match self.lines.get_mut(&pin) {
            Some(Line::Output(driver)) => {
                let level = if value == 1 { Level::High } else { Level::Low };
                Self::wrap("write", driver.set_level(level))
            }
            _ => Err(AdapterError::new("write", sys::ESP_ERR_INVALID_STATE as i32)),
        }
    }

    fn read(&mut self, pin: u8) -> Result<u8, AdapterError> {
        match self.lines.get(&pin) {
            Some(Line::Input(driver)) => Ok(u8::from(driver.is_high())),
            Some(Line::Output(driver)) => Ok(u8::from(driver.is_set_high())),
            None => Err(AdapterError::new("read", sys::ESP_ERR_INVALID_STATE as i32)),
        }
    }

    fn pwm_set_duty(&mut self, handle: &mut LedcPwm, duty: f32) -> Result<(), AdapterError> {
        handle.duty_percent = duty;
        Self::apply_duty(handle)
    }

    fn pwm_set_frequency(
        &mut self,
        handle: &mut LedcPwm,
        frequency_hz: u32,
    ) -> Result<(), AdapterError> {
        // Resolution depends on frequency, so reprogram the whole slot and
        // rescale the current duty onto the new bit width.
        let bits = Self::duty_bits(frequency_hz);
        Self::program_slot("pwm_set_frequency", handle.pin, handle.slot, frequency_hz, bits)?;
        handle.bits = bits;
        Self::apply_duty(handle)
    }

    fn pwm_stop(&mut self, handle: &mut LedcPwm) -> Result<(), AdapterError> {
        let channel = sys::ledc_channel_t_LEDC_CHANNEL_0 + handle.slot as u32;
        // SAFETY: stops a channel this adapter configured; idle level low.
        let rc = unsafe { sys::ledc_stop(sys::ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, 0) };
        self.slot_used[handle.slot] = false;
        Self::esp("pwm_stop", rc)
    }

    fn release(&mut self, pin: u8) -> Result<(), AdapterError> {
        // Dropping the pin driver detaches it; reset returns the pad to
        // its power-on state (also covers PWM pins, which have no driver).
        self.lines.remove(&pin);
        // SAFETY: gpio_reset_pin is valid for any pad number the registry
        // admits; it only touches this pin's own config registers.
        Self::esp("release", unsafe { sys::gpio_reset_pin(i32::from(pin)) })
    }

    fn release_all(&mut self) -> Result<(), AdapterError> {
        let pins: Vec<u8> = self.lines.keys().copied().collect();
        self.lines.clear();
        for pin in pins {
            // SAFETY: as in release().
            let rc = unsafe { sys::gpio_reset_pin(i32::from(pin)) };
            Self::esp("release_all", rc)?;
        }
        Ok(())
    }
}
