//! Pindeck Firmware — Main Entry Point
//!
//! Hexagonal architecture: the pin-state core in the middle, adapters on
//! the ring.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  EspGpioAdapter    LogEventSink    ChannelEventSink          │
//! │  (GpioPort)        (EventSink)     (EventSink → I/O task)    │
//! │                                                              │
//! │  ────────────── Port Trait Boundary ──────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │           GpioService (pure logic)                 │      │
//! │  │  PinRegistry · SafetyValidator · PinMonitor        │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The RPC transport and the on-device GUI attach to the service through
//! [`PinCommand`](pindeck::app::commands::PinCommand) and the event
//! bridge; this binary wires the core and keeps it alive.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use pindeck::adapters::channel_sink::ChannelEventSink;
use pindeck::adapters::esp_gpio::EspGpioAdapter;
use pindeck::adapters::log_sink::LogEventSink;
use pindeck::app::service::GpioService;
use pindeck::config::SystemConfig;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Pindeck v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration (in-memory; nothing persists) ────────
    let config = SystemConfig::default();
    let health_interval =
        std::time::Duration::from_secs(u64::from(config.health_log_interval_secs));

    // ── 3. Core service over the real adapter ─────────────────
    let service = GpioService::new(EspGpioAdapter::new(), config);
    service.attach_sink(Box::new(LogEventSink::new()));
    service.attach_sink(Box::new(ChannelEventSink::new(service.stats_arc())));

    info!(
        "Pins available: {:?} (reserved: {:?})",
        pindeck::pins::SAFE_PINS,
        pindeck::pins::RESERVED_PINS
    );
    info!("System ready.");

    // ── 4. Idle loop ──────────────────────────────────────────
    //
    // Front-end tasks drive the service; this thread only reports health.
    loop {
        std::thread::sleep(health_interval);
        let health = service.health();
        info!(
            "HEALTH | up={}s pins={} monitor={} ops={} events={} (dropped {})",
            health.uptime_secs,
            health.configured_pins,
            if health.monitor_active { "on" } else { "off" },
            health.ops_total,
            health.events_published,
            health.events_dropped,
        );
    }
}
