//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured pin events to the
//! logger (UART / USB-CDC in production). Other sinks — the RPC push
//! channel, the on-device display — implement the same trait.

use log::{debug, info};

use crate::app::events::PinEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`PinEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PinEvent) {
        match event {
            PinEvent::Configured(s) => {
                if s.mode == crate::registry::PinMode::Pwm {
                    info!(
                        "PIN   | {} configured as {} ({} Hz)",
                        s.pin,
                        s.mode,
                        s.pwm_frequency_hz.unwrap_or(0),
                    );
                } else {
                    info!("PIN   | {} configured as {} (value={})", s.pin, s.mode, s.value);
                }
            }
            PinEvent::Changed(s) => match s.pwm_duty_percent {
                Some(duty) => info!("PIN   | {} duty={:.1}%", s.pin, duty),
                None => info!("PIN   | {} value={}", s.pin, s.value),
            },
            PinEvent::Released { pin } => {
                info!("PIN   | {} released", pin);
            }
            PinEvent::AllReleased { count } => {
                info!("PIN   | all released ({count} pins)");
            }
            PinEvent::MonitorBatch(batch) => {
                // Per-tick batches are too chatty for info level.
                debug!(
                    "MON   | t={}ms {} readings",
                    batch.uptime_ms,
                    batch.readings.len()
                );
            }
        }
    }
}
