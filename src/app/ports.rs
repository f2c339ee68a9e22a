//! Port traits: the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LightController / LatchedReceiver / ControlPanel
//! ```
//!
//! Driven adapters (PWM outputs, GPIO lines, ADC, pager notifier, event
//! sinks, clocks) implement these traits.  The domain components consume
//! them via generics or trait objects, so none of them touches hardware
//! directly and all of them run on the host under test.
//!
//! Plain digital outputs and delays use the `embedded-hal` 1.0 traits
//! (`OutputPin`, `DelayNs`) instead of a port of their own.

use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;

use super::events::AppEvent;
use crate::error::{DriveError, EdgeReadError, LineError};
use crate::light::LightState;

// ───────────────────────────────────────────────────────────────
// Light output port (domain → LED strip)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the four-channel LED strip.
///
/// Implementations perform four independent writes.  A zero channel must
/// become a definite "off" write (PWM stopped, line low), never a
/// zero-width PWM request.
pub trait LightOutput: Send {
    fn apply(&mut self, state: &LightState) -> Result<(), DriveError>;
}

impl<T: LightOutput + ?Sized> LightOutput for Box<T> {
    fn apply(&mut self, state: &LightState) -> Result<(), DriveError> {
        (**self).apply(state)
    }
}

// ───────────────────────────────────────────────────────────────
// Edge input port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// An input line configured for rising-edge detection.
pub trait EdgeInput: Send {
    /// Physical line number, for logging.
    fn line(&self) -> u8;

    /// Block until a rising edge arrives or `timeout` elapses.
    /// Returns `Ok(true)` on an edge and `Ok(false)` on timeout.
    fn wait_for_rising_edge(&mut self, timeout: Duration) -> Result<bool, EdgeReadError>;
}

// ───────────────────────────────────────────────────────────────
// GPIO bank (line acquisition)
// ───────────────────────────────────────────────────────────────

/// Hands out configured lines.  A line that is dropped is released.
pub trait GpioBank {
    type Output: OutputPin + Send + 'static;
    type Input: EdgeInput + 'static;

    /// Claim `pin` as an output, initially driven low.
    fn claim_output_low(&mut self, pin: u8) -> Result<Self::Output, LineError>;

    /// Claim `pin` as an input with rising-edge sensitivity.
    fn claim_rising_edge_input(&mut self, pin: u8) -> Result<Self::Input, LineError>;
}

// ───────────────────────────────────────────────────────────────
// Panel peripherals
// ───────────────────────────────────────────────────────────────

/// Piezo speaker driven with a square wave.
pub trait Speaker: Send {
    fn tone(&mut self, hz: u32) -> Result<(), DriveError>;
    fn silence(&mut self) -> Result<(), DriveError>;
}

/// Multi-channel ADC (the panels' dimmer potentiometers).
pub trait AnalogInput: Send {
    /// Raw 10-bit reading of `channel`.
    fn read_channel(&mut self, channel: u8) -> Result<u16, LineError>;
}

// ───────────────────────────────────────────────────────────────
// Pager notifier (domain → upstream)
// ───────────────────────────────────────────────────────────────

/// Where a page originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerSource {
    /// The physical pager button on control panel `n`.
    Panel(u8),
    /// RF remote channel D.
    Remote,
}

/// Fire-and-forget page notification.  Delivery and retry policy belong
/// to the implementation.
pub trait PagerNotifier: Send + Sync {
    fn notify(&self, source: PagerSource);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`]s through this port.
pub trait EventSink: Send {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  The ramp computes progress from this clock,
/// never from a tick count.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
