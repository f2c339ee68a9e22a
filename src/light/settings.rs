//! Full / low / off presets derived from the configured colour mix.

use serde::{Deserialize, Serialize};

use super::level::ChannelLevel;
use super::state::{ChannelMix, LightName, LightState};
use crate::error::LightError;

/// Colour mix at 100% power plus the low-power multiplier.
///
/// Every preset is derived from these two values, so reconfiguring the
/// mix changes `full()` and `low()` together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSettings {
    full_mix: ChannelMix,
    low_fraction: f64,
}

impl LightSettings {
    /// White is always driven at full scale at 100% power; the other
    /// channels tint it.
    pub fn new(full_mix: ChannelMix, low_fraction: f64) -> Result<Self, LightError> {
        let mut settings = Self {
            full_mix: ChannelMix::default(),
            low_fraction: 0.0,
        };
        settings.configure_colors(full_mix);
        settings.configure_dim(low_fraction)?;
        Ok(settings)
    }

    pub fn full(&self) -> LightState {
        LightState::from_mix(LightName::Full, &self.full_mix)
    }

    /// Full-power mix scaled by the low-power fraction.
    pub fn low(&self) -> LightState {
        self.full().scaled(self.low_fraction, LightName::Low)
    }

    pub fn off(&self) -> LightState {
        LightState::off()
    }

    pub fn full_mix(&self) -> ChannelMix {
        self.full_mix
    }

    pub fn low_fraction(&self) -> f64 {
        self.low_fraction
    }

    /// Replace the full-power mix.  White is forced to full scale.
    pub fn configure_colors(&mut self, mix: ChannelMix) {
        self.full_mix = ChannelMix {
            white: ChannelLevel::MAX,
            ..mix
        };
    }

    /// Set the low-power multiplier.  Must lie in `[0.0, 1.0]`.
    pub fn configure_dim(&mut self, fraction: f64) -> Result<(), LightError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(LightError::InvalidMultiplier(fraction));
        }
        self.low_fraction = fraction;
        Ok(())
    }
}

impl Default for LightSettings {
    /// Soft white: red 60%, green 10%, white 100%, blue off; low = 10%.
    fn default() -> Self {
        Self {
            full_mix: ChannelMix::from_percent(60.0, 10.0, 100.0, 0.0),
            low_fraction: 0.1,
        }
    }
}
