//! Application core — pin-state management, zero direct I/O.
//!
//! This module contains the business rules of the Pindeck controller:
//! validated pin configuration, hardware-resource lifecycle, and the
//! front-end command surface. All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
