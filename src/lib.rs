//! Pindeck firmware library.
//!
//! Exposes the pin-state core for integration testing and for the two
//! front-ends (RPC transport and on-device GUI) built on top of it. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the whole crate builds and tests on the host
//! against the deterministic mock adapter.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod monitor;
pub mod notifier;
pub mod pins;
pub mod safety;

mod error;
pub mod registry;

pub use error::{AdapterError, Error, Result};

// Re-export the ESP-IDF-only modules so the crate compiles everywhere;
// the platform implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
mod esp_link_shims;
