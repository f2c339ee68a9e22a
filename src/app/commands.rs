//! Inbound commands to the light controller.
//!
//! These represent actions requested by the outside world (RF remote,
//! console, a future HTTP surface) that the
//! [`LightController`](super::controller::LightController) interprets.

use core::fmt;
use core::str::FromStr;

use crate::light::{ChannelLevel, ChannelMix};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightCommand {
    /// Full-power preset.
    On,
    /// All channels dark.
    Off,
    /// Low-power preset.
    Dim,
    /// Advance the off → low → full → off cycle.
    Toggle,
    /// Start a wake-up ramp to the full-power preset.
    Wakeup,
    /// Stop a running ramp, leaving the light where it is.
    Halt,
    /// Replace the full-power colour mix.
    Color(ChannelMix),
    /// Replace the low-power fraction of full power.
    DimLevel(f64),
}

impl LightCommand {
    /// Commands spelled as a single word.
    pub const WORDS: [Self; 6] = [
        Self::On,
        Self::Off,
        Self::Dim,
        Self::Toggle,
        Self::Wakeup,
        Self::Halt,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Dim => "dim",
            Self::Toggle => "toggle",
            Self::Wakeup => "wakeup",
            Self::Halt => "halt",
            Self::Color(_) => "color",
            Self::DimLevel(_) => "dim-level",
        }
    }

    /// Commands that cancel a running ramp before acting.  `Toggle` ends
    /// the ramp itself in the same step as the cycle transition.
    pub const fn halts_ramp(self) -> bool {
        !matches!(self, Self::Wakeup | Self::Toggle)
    }
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = |level: ChannelLevel| level.fraction() * 100.0;
        match *self {
            Self::Color(mix) => write!(
                f,
                "color {} {} {} {}",
                percent(mix.red),
                percent(mix.green),
                percent(mix.white),
                percent(mix.blue)
            ),
            Self::DimLevel(fraction) => write!(f, "dim-level {fraction}"),
            cmd => f.write_str(cmd.as_str()),
        }
    }
}

/// A console or remote line that is not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error(
        "unknown command '{0}' (expected one of: on, off, dim, toggle, wakeup, halt, \
         color <r> <g> <w> <b>, dim-level <fraction>)"
    )]
    Unknown(String),
    #[error("'{command}' takes {expected} argument(s), got {got}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("'{command}': invalid value '{value}' (expected {range})")]
    InvalidValue {
        command: &'static str,
        value: String,
        range: &'static str,
    },
}

impl FromStr for LightCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let word = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        match word.to_ascii_lowercase().as_str() {
            "color" | "colour" => {
                let [red, green, white, blue] = numbers::<4>("color", &args, 0.0..=100.0, "0-100")?;
                return Ok(Self::Color(ChannelMix::from_percent(red, green, white, blue)));
            }
            "dim-level" => {
                let [fraction] = numbers::<1>("dim-level", &args, 0.0..=1.0, "0.0-1.0")?;
                return Ok(Self::DimLevel(fraction));
            }
            _ => {}
        }

        let cmd = Self::WORDS
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(word))
            .or_else(|| match word.to_ascii_lowercase().as_str() {
                "full" => Some(Self::On),
                "low" => Some(Self::Dim),
                "stop" => Some(Self::Halt),
                _ => None,
            })
            .ok_or_else(|| ParseCommandError::Unknown(word.to_string()))?;
        if !args.is_empty() {
            return Err(ParseCommandError::WrongArity {
                command: cmd.as_str(),
                expected: 0,
                got: args.len(),
            });
        }
        Ok(cmd)
    }
}

/// Parse exactly `N` numbers, each inside `range`.
fn numbers<const N: usize>(
    command: &'static str,
    args: &[&str],
    range: core::ops::RangeInclusive<f64>,
    expected: &'static str,
) -> Result<[f64; N], ParseCommandError> {
    if args.len() != N {
        return Err(ParseCommandError::WrongArity {
            command,
            expected: N,
            got: args.len(),
        });
    }
    let mut out = [0.0; N];
    for (slot, raw) in out.iter_mut().zip(args) {
        *slot = raw
            .parse::<f64>()
            .ok()
            .filter(|v| range.contains(v))
            .ok_or_else(|| ParseCommandError::InvalidValue {
                command,
                value: (*raw).to_string(),
                range: expected,
            })?;
    }
    Ok(out)
}
