//! Named illumination level plus its four channel duties.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::level::ChannelLevel;

/// Human-meaningful summary of a [`LightState`].
///
/// `Wakeup` is set while a ramp session runs and kept if the ramp is
/// halted, so the touch cycle treats a halted ramp as an unfinished one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightName {
    Off,
    Low,
    Full,
    Wakeup,
}

impl fmt::Display for LightName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Full => "full",
            Self::Wakeup => "wakeup",
        })
    }
}

/// One of the four LED strip channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    White,
    Blue,
}

impl Channel {
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::White, Self::Blue];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::White => "white",
            Self::Blue => "blue",
        }
    }
}

/// Colour mix for the four channels, without a name.  Used for the
/// full-power preset and for explicit colour requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMix {
    pub red: ChannelLevel,
    pub green: ChannelLevel,
    pub white: ChannelLevel,
    pub blue: ChannelLevel,
}

impl ChannelMix {
    /// Build a mix from percentages of full scale.
    pub fn from_percent(red: f64, green: f64, white: f64, blue: f64) -> Self {
        Self {
            red: ChannelLevel::from_percent(red),
            green: ChannelLevel::from_percent(green),
            white: ChannelLevel::from_percent(white),
            blue: ChannelLevel::from_percent(blue),
        }
    }
}

/// Current (or requested) illumination of the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub name: LightName,
    pub red: ChannelLevel,
    pub green: ChannelLevel,
    pub white: ChannelLevel,
    pub blue: ChannelLevel,
}

impl LightState {
    /// All channels dark.
    pub const fn off() -> Self {
        Self {
            name: LightName::Off,
            red: ChannelLevel::OFF,
            green: ChannelLevel::OFF,
            white: ChannelLevel::OFF,
            blue: ChannelLevel::OFF,
        }
    }

    /// Take every channel from `mix`.  Channels the mix leaves at zero are
    /// zero here too; nothing is inherited from a previous state.
    pub const fn from_mix(name: LightName, mix: &ChannelMix) -> Self {
        Self {
            name,
            red: mix.red,
            green: mix.green,
            white: mix.white,
            blue: mix.blue,
        }
    }

    pub const fn mix(&self) -> ChannelMix {
        ChannelMix {
            red: self.red,
            green: self.green,
            white: self.white,
            blue: self.blue,
        }
    }

    pub const fn level(&self, channel: Channel) -> ChannelLevel {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::White => self.white,
            Channel::Blue => self.blue,
        }
    }

    /// Channel/level pairs in output order.
    pub fn channels(&self) -> [(Channel, ChannelLevel); 4] {
        Channel::ALL.map(|c| (c, self.level(c)))
    }

    pub fn is_dark(&self) -> bool {
        Channel::ALL.iter().all(|&c| self.level(c).is_off())
    }

    /// Every channel multiplied by `factor` (clamped to `[0, 1]`), renamed.
    pub fn scaled(&self, factor: f64, name: LightName) -> Self {
        Self {
            name,
            red: self.red.scale(factor),
            green: self.green.scale(factor),
            white: self.white.scale(factor),
            blue: self.blue.scale(factor),
        }
    }

    /// Every channel split into `parts` equal steps.
    pub const fn divided(&self, parts: u32) -> ChannelMix {
        ChannelMix {
            red: self.red.divide(parts),
            green: self.green.divide(parts),
            white: self.white.divide(parts),
            blue: self.blue.divide(parts),
        }
    }
}

impl Default for LightState {
    fn default() -> Self {
        Self::off()
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (r={} g={} w={} b={})",
            self.name, self.red, self.green, self.white, self.blue
        )
    }
}
