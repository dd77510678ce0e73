//! Inbound commands and their replies.
//!
//! The typed, transport-neutral form of the front-end contract. A
//! request/response transport decodes client frames into [`PinCommand`]
//! and hands them to
//! [`GpioService::handle_command`](super::service::GpioService::handle_command);
//! the on-device GUI constructs the same commands from touch input. Both
//! serialize [`CommandReply`] (or the error code/message pair) back out.

use serde::{Deserialize, Serialize};

use crate::diagnostics::ServiceHealth;
use crate::registry::{ConfigureRequest, PinSnapshot};

/// Commands the outside world can send into the pin-state core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PinCommand {
    /// Inventory of available, reserved, and configured pins.
    ListPins,

    /// Snapshot of one configured pin.
    GetPin { pin: u8 },

    /// Configure (or destructively reconfigure) a pin.
    ConfigurePin(ConfigureRequest),

    /// Drive an output pin to a level.
    WritePin { pin: u8, value: u8 },

    /// Sample an input pin.
    ReadPin { pin: u8 },

    /// Update a PWM pin's duty cycle (and optionally frequency).
    SetPwm {
        pin: u8,
        duty_cycle: f32,
        #[serde(default)]
        frequency: Option<u32>,
    },

    /// Release one pin (idempotent).
    DeletePin { pin: u8 },

    /// Release every configured pin.
    DeleteAllPins,

    /// Start (or replace) background monitoring of a pin set.
    Subscribe {
        pins: Vec<u8>,
        #[serde(default)]
        interval_ms: Option<u32>,
    },

    /// Stop background monitoring.
    Unsubscribe,

    /// Service liveness and counters.
    Health,
}

/// Successful command outcomes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    Pins(PinInventory),
    Snapshot(PinSnapshot),
    Deleted { pin: u8 },
    AllDeleted { count: usize },
    Subscribed { pins: Vec<u8>, interval_ms: u32 },
    Unsubscribed,
    Health(ServiceHealth),
}

/// Reply payload of [`PinCommand::ListPins`].
#[derive(Debug, Clone, Serialize)]
pub struct PinInventory {
    pub available_pins: Vec<u8>,
    pub reserved_pins: Vec<u8>,
    pub configured_pins: Vec<PinSnapshot>,
}
