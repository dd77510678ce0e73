//! Property tests for registry robustness.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32
//! targets. Arbitrary operation sequences, including invalid pins,
//! reserved pins, and out-of-range parameters, must never panic and must
//! always leave the registry and the mock hardware in agreement.

#![cfg(not(target_os = "espidf"))]

use pindeck::adapters::mock_gpio::MockGpioAdapter;
use pindeck::app::ports::NullEventSink;
use pindeck::registry::{ConfigureRequest, PinMode, PinRegistry, PullMode};
use proptest::prelude::*;

// A pool mixing safe, reserved, and invalid pin numbers so every error
// path gets exercised alongside the happy ones.
const PIN_POOL: [u8; 8] = [0, 4, 6, 13, 17, 18, 21, 28];

#[derive(Debug, Clone)]
enum Op {
    Configure {
        pin: u8,
        mode: PinMode,
        pull: PullMode,
        initial: u8,
        frequency: Option<u32>,
    },
    Write { pin: u8, value: u8 },
    Read { pin: u8 },
    SetPwm {
        pin: u8,
        duty: f32,
        frequency: Option<u32>,
    },
    Delete { pin: u8 },
    DeleteAll,
}

fn arb_pin() -> impl Strategy<Value = u8> {
    proptest::sample::select(&PIN_POOL)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (
            arb_pin(),
            prop_oneof![
                Just(PinMode::Input),
                Just(PinMode::Output),
                Just(PinMode::Pwm)
            ],
            prop_oneof![Just(PullMode::None), Just(PullMode::Up), Just(PullMode::Down)],
            0u8..=2u8,
            proptest::option::of(0u32..=5000u32),
        )
            .prop_map(|(pin, mode, pull, initial, frequency)| Op::Configure {
                pin,
                mode,
                pull,
                initial,
                frequency,
            }),
        (arb_pin(), 0u8..=2u8).prop_map(|(pin, value)| Op::Write { pin, value }),
        arb_pin().prop_map(|pin| Op::Read { pin }),
        (
            arb_pin(),
            -10.0f32..=120.0f32,
            proptest::option::of(0u32..=5000u32)
        )
            .prop_map(|(pin, duty, frequency)| Op::SetPwm {
                pin,
                duty,
                frequency,
            }),
        arb_pin().prop_map(|pin| Op::Delete { pin }),
        Just(Op::DeleteAll),
    ]
}

fn apply(reg: &mut PinRegistry<MockGpioAdapter>, op: &Op) {
    let sink = &mut NullEventSink;
    match op {
        Op::Configure {
            pin,
            mode,
            pull,
            initial,
            frequency,
        } => {
            let req = ConfigureRequest {
                pin: *pin,
                mode: *mode,
                pull: *pull,
                initial_value: *initial,
                pwm_frequency_hz: *frequency,
            };
            let _ = reg.configure(&req, sink);
        }
        Op::Write { pin, value } => {
            let _ = reg.write(*pin, *value, sink);
        }
        Op::Read { pin } => {
            let _ = reg.read(*pin);
        }
        Op::SetPwm {
            pin,
            duty,
            frequency,
        } => {
            let _ = reg.set_pwm(*pin, *duty, *frequency, sink);
        }
        Op::Delete { pin } => reg.release(*pin, sink),
        Op::DeleteAll => {
            reg.release_all(sink);
        }
    }
}

proptest! {
    /// The mock's view of claimed hardware always matches the registry's
    /// map, and exactly the PWM-mode entries hold a live oscillator.
    #[test]
    fn hardware_and_registry_agree(ops in proptest::collection::vec(arb_op(), 1..=60)) {
        let mut reg = PinRegistry::new(MockGpioAdapter::new());
        for op in &ops {
            apply(&mut reg, op);

            prop_assert_eq!(
                reg.adapter().claim_count(),
                reg.configured_count(),
                "claims out of sync after {:?}", op
            );
            let pwm_entries = reg
                .all_pins_info()
                .iter()
                .filter(|s| s.mode == PinMode::Pwm)
                .count();
            prop_assert_eq!(
                reg.adapter().live_pwm_count(),
                pwm_entries,
                "oscillator leak after {:?}", op
            );
        }
    }

    /// Every snapshot the registry ever exposes honors the parameter
    /// invariants, whatever garbage the operations threw at it.
    #[test]
    fn snapshots_always_in_bounds(ops in proptest::collection::vec(arb_op(), 1..=60)) {
        let mut reg = PinRegistry::new(MockGpioAdapter::new());
        for op in &ops {
            apply(&mut reg, op);
        }
        for snap in reg.all_pins_info() {
            prop_assert!(snap.value <= 1);
            prop_assert!(snap.is_available);
            prop_assert!(!snap.is_reserved);
            if snap.mode == PinMode::Pwm {
                let duty = snap.pwm_duty_percent.expect("pwm entry must carry duty");
                let freq = snap.pwm_frequency_hz.expect("pwm entry must carry frequency");
                prop_assert!((0.0..=100.0).contains(&duty));
                prop_assert!(freq > 0);
            } else {
                prop_assert!(snap.pwm_duty_percent.is_none());
                prop_assert!(snap.pwm_frequency_hz.is_none());
            }
        }
    }

    /// After any sequence, releasing everything always converges to a
    /// clean slate — and doing it twice is harmless.
    #[test]
    fn release_all_always_converges(ops in proptest::collection::vec(arb_op(), 1..=60)) {
        let mut reg = PinRegistry::new(MockGpioAdapter::new());
        for op in &ops {
            apply(&mut reg, op);
        }
        reg.release_all(&mut NullEventSink);
        prop_assert_eq!(reg.configured_count(), 0);
        prop_assert_eq!(reg.adapter().claim_count(), 0);
        prop_assert_eq!(reg.adapter().live_pwm_count(), 0);

        reg.release_all(&mut NullEventSink);
        prop_assert_eq!(reg.configured_count(), 0);
    }
}
