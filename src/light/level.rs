//! Per-channel PWM duty value.
//!
//! A [`ChannelLevel`] is an integer duty in `[0, MAX_DUTY]`.  Every
//! constructor and arithmetic operation saturates, so no code path can
//! produce a value outside the range the output driver accepts.

use core::fmt;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// Normalised duty for a single LED channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ChannelLevel(u32);

impl ChannelLevel {
    /// Full-scale duty (24-bit duty register).
    pub const MAX_DUTY: u32 = 1 << 24;

    pub const OFF: Self = Self(0);
    pub const MAX: Self = Self(Self::MAX_DUTY);

    /// Build a level from a raw duty, clamping to `MAX_DUTY`.
    pub const fn new(raw: u32) -> Self {
        if raw > Self::MAX_DUTY {
            Self(Self::MAX_DUTY)
        } else {
            Self(raw)
        }
    }

    /// Build a level from a fraction of full scale.  Out-of-range and NaN
    /// inputs clamp to the nearest bound.
    pub fn from_fraction(fraction: f64) -> Self {
        Self::MAX.scale(fraction)
    }

    /// Build a level from a percentage of full scale (`60.0` = 60%).
    pub fn from_percent(percent: f64) -> Self {
        Self::from_fraction(percent / 100.0)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Fraction of full scale in `[0.0, 1.0]`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX_DUTY)
    }

    pub const fn saturating_add(self, other: Self) -> Self {
        Self::new(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiply by `factor`, clamped to `[0.0, 1.0]`.  The result never
    /// exceeds `self` and is non-decreasing in `factor`.
    pub fn scale(self, factor: f64) -> Self {
        let factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        let scaled = (f64::from(self.0) * factor).round() as u32;
        Self(scaled.min(self.0))
    }

    /// Split into `parts` equal steps (integer division, `parts == 0` → off).
    pub const fn divide(self, parts: u32) -> Self {
        match self.0.checked_div(parts) {
            Some(step) => Self(step),
            None => Self::OFF,
        }
    }
}

impl Add for ChannelLevel {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl TryFrom<u32> for ChannelLevel {
    type Error = String;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        if raw > Self::MAX_DUTY {
            return Err(format!("duty {raw} exceeds maximum {}", Self::MAX_DUTY));
        }
        Ok(Self(raw))
    }
}

impl From<ChannelLevel> for u32 {
    fn from(level: ChannelLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ChannelLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.fraction() * 100.0)
    }
}
