//! GPIO pin map for the Pindeck breakout board.
//!
//! Single source of truth — the validator and adapters reference this module
//! rather than hard-coding pin numbers. Change the board layout here and it
//! propagates everywhere.

/// Pins exposed on the breakout header and safe to hand to clients.
pub const SAFE_PINS: [u8; 24] = [
    2, 3, 4, 5, 7, 8, 9, 10, 11, 12, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];

/// Pins permanently claimed by fixed board functions (USB hub enable and
/// strapping). Never configurable, regardless of [`SAFE_PINS`] membership.
pub const RESERVED_PINS: [u8; 2] = [6, 13];

/// True iff `pin` is in [`SAFE_PINS`].
pub fn is_safe(pin: u8) -> bool {
    SAFE_PINS.contains(&pin)
}

/// True iff `pin` is in [`RESERVED_PINS`].
pub fn is_reserved(pin: u8) -> bool {
    RESERVED_PINS.contains(&pin)
}

// ---------------------------------------------------------------------------
// Electrical limits
// ---------------------------------------------------------------------------
//
// Not enforced by the silicon — validated as a design constraint and
// surfaced in client documentation for output fan-out planning.

/// Maximum safe source/sink current per pin (mA).
pub const MAX_CURRENT_PER_PIN_MA: u32 = 16;

/// Maximum aggregate current across all output pins (mA).
pub const MAX_TOTAL_CURRENT_MA: u32 = 50;

// ---------------------------------------------------------------------------
// PWM limits (LEDC peripheral)
// ---------------------------------------------------------------------------

/// LEDC ceiling. Requests above this are rejected before reaching hardware.
pub const PWM_MAX_FREQUENCY_HZ: u32 = 40_000_000;

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

/// Upper bound on the subscribed pin set of a monitoring session.
/// Comfortably above the 24 safe pins; bounds the per-tick batch size.
pub const MAX_MONITORED_PINS: usize = 32;
