//! Unified error types for the Pindeck firmware core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! front-end boundary's error handling uniform. All variants are `Copy` so
//! they can be cheaply returned through the registry and service layers
//! without allocation. Each variant maps to a stable machine-checkable
//! code via [`Error::code`]; the `Display` impl carries the human-readable
//! half of the contract.

use core::fmt;

use crate::registry::PinMode;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible pin operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The pin is not a member of the board's safe pin set.
    InvalidPin(u8),
    /// The pin is permanently reserved by a fixed hardware assignment.
    Reserved(u8),
    /// The operation targets a pin that has no configuration entry.
    NotFound(u8),
    /// The operation is incompatible with the pin's configured mode.
    StateError { pin: u8, mode: PinMode },
    /// A required parameter was not supplied.
    MissingParameter(&'static str),
    /// A supplied parameter is outside its allowed bounds.
    Range(&'static str),
    /// A hardware call failed unexpectedly.
    Adapter(AdapterError),
}

impl Error {
    /// Stable machine-checkable error kind, distinct from the display
    /// message. Front-ends key their status mapping off this string.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPin(_) => "invalid_pin",
            Self::Reserved(_) => "reserved_pin",
            Self::NotFound(_) => "not_found",
            Self::StateError { .. } => "state_error",
            Self::MissingParameter(_) => "missing_parameter",
            Self::Range(_) => "range_error",
            Self::Adapter(_) => "adapter_error",
        }
    }

    /// True for validation failures (caller mistakes); false for
    /// unexpected hardware-level failures.
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Adapter(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "pin {pin} is not in the safe pin set"),
            Self::Reserved(pin) => write!(f, "pin {pin} is reserved by the board"),
            Self::NotFound(pin) => write!(f, "pin {pin} is not configured"),
            Self::StateError { pin, mode } => {
                write!(f, "pin {pin} is configured as {mode}")
            }
            Self::MissingParameter(name) => write!(f, "missing parameter: {name}"),
            Self::Range(msg) => write!(f, "out of range: {msg}"),
            Self::Adapter(e) => write!(f, "hardware adapter: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware adapter errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`GpioPort`](crate::app::ports::GpioPort)
/// implementation. Carries the adapter operation name and the platform
/// return code (ESP-IDF `esp_err_t` on hardware, a synthetic code in the
/// mock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterError {
    /// Adapter operation that failed (e.g. `"setup_pwm"`).
    pub op: &'static str,
    /// Platform return code.
    pub code: i32,
}

impl AdapterError {
    pub const fn new(op: &'static str, code: i32) -> Self {
        Self { op, code }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed (rc={})", self.op, self.code)
    }
}

impl From<AdapterError> for Error {
    fn from(e: AdapterError) -> Self {
        Self::Adapter(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
