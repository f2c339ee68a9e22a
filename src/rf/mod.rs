//! Four-channel latched RF remote receiver.
//!
//! The receiver module latches each channel output high when a button on
//! the remote is pressed and holds it until the shared reset line is
//! pulsed.  [`LatchedReceiver`] watches the four outputs, runs the
//! handler registered for a channel on every rising edge and then clears
//! the latch.

mod receiver;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use receiver::{Handler, LatchedReceiver, RunningReceiver};

/// One of the four remote buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RfChannel {
    A,
    B,
    C,
    D,
}

impl RfChannel {
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Line name used in initialisation errors.
    pub const fn line_name(self) -> &'static str {
        match self {
            Self::A => "RF channel A",
            Self::B => "RF channel B",
            Self::C => "RF channel C",
            Self::D => "RF channel D",
        }
    }
}

impl fmt::Display for RfChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// GPIO lines the receiver module is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfPins {
    pub reset: u8,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
}

impl RfPins {
    pub const fn channel(&self, channel: RfChannel) -> u8 {
        match channel {
            RfChannel::A => self.a,
            RfChannel::B => self.b,
            RfChannel::C => self.c,
            RfChannel::D => self.d,
        }
    }

    /// Every line, reset first.
    pub const fn all(&self) -> [u8; 5] {
        [self.reset, self.a, self.b, self.c, self.d]
    }
}

impl Default for RfPins {
    fn default() -> Self {
        Self {
            reset: 17,
            a: 23,
            b: 25,
            c: 8,
            d: 24,
        }
    }
}
