//! Outbound application events.
//!
//! The [`LightController`](super::controller::LightController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to the console, forward to
//! a home-automation hub, etc.

use std::time::Duration;

use crate::light::LightState;

/// Why a running wake-up ramp stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampStop {
    /// An explicit halt request.
    Halted,
    /// An immediate state change took over the output.
    Superseded,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The output was driven to a new state.
    LightChanged { from: LightState, to: LightState },

    /// A wake-up ramp session started.
    WakeupStarted { duration: Duration, target: LightState },

    /// The ramp reached its final state.
    WakeupCompleted { target: LightState },

    /// The ramp stopped early; the light stays where it was.
    WakeupStopped { reason: RampStop, at: LightState },
}
