//! Node configuration parameters
//!
//! All tunable parameters for a lighting node.  Values start from
//! [`NodeConfig::default`], may be replaced by a JSON file named in
//! `WAKELIGHT_CONFIG`, and are finally overridden field by field from
//! environment variables.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::app::controller::RampConfig;
use crate::error::{ConfigError, LightError};
use crate::light::{Channel, ChannelMix, LightSettings};
use crate::rf::RfPins;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "WAKELIGHT_CONFIG";

/// Full-power colour mix in percent of full scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixPercent {
    pub red: f64,
    pub green: f64,
    pub white: f64,
    pub blue: f64,
}

impl MixPercent {
    pub fn to_mix(&self) -> ChannelMix {
        ChannelMix::from_percent(self.red, self.green, self.white, self.blue)
    }
}

/// LED strip channel lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedPins {
    pub red: u8,
    pub green: u8,
    pub white: u8,
    pub blue: u8,
}

impl LedPins {
    pub const fn pin(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::White => self.white,
            Channel::Blue => self.blue,
        }
    }
}

/// SPI location of the dimmer ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcConfig {
    pub bus: u8,
    pub slave_select: u8,
    pub clock_hz: u32,
}

/// One wall control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub enabled: bool,
    /// ADC channel of the dimmer knob.
    pub dimmer_channel: u8,
    pub pager_pin: u8,
    pub touch_pin: u8,
    pub led_pin: u8,
    pub speaker_pin: u8,
    /// Latch reset for the pager and touch inputs.
    pub reset_pin: u8,
}

impl PanelConfig {
    fn pins(&self) -> [u8; 5] {
        [
            self.pager_pin,
            self.touch_pin,
            self.led_pin,
            self.speaker_pin,
            self.reset_pin,
        ]
    }
}

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- Identity / logging ---
    pub node_name: String,
    /// `env_logger` filter, e.g. `debug` or `wakelight=info`.
    pub log_level: String,

    // --- Wake-up ramp ---
    pub wakeup_duration_secs: u64,
    pub wakeup_tick_secs: u64,

    // --- Light presets ---
    pub full_power: MixPercent,
    /// Low preset as a fraction of full power (0.0-1.0).
    pub low_power_fraction: f64,

    // --- LED strip ---
    pub led_strip_enabled: bool,
    pub led_pins: LedPins,
    pub pwm_frequency_hz: f64,

    // --- RF receiver ---
    pub rf_pins: RfPins,
    /// Bound on each edge wait; also bounds shutdown latency.
    pub rf_wait_timeout_ms: u64,

    // --- Control panels ---
    pub adc: AdcConfig,
    pub panels: [PanelConfig; 2],
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: "bedroom".into(),
            log_level: "debug".into(),

            wakeup_duration_secs: 30 * 60,
            wakeup_tick_secs: 30,

            full_power: MixPercent {
                red: 60.0,
                green: 10.0,
                white: 100.0,
                blue: 0.0,
            },
            low_power_fraction: 0.1,

            led_strip_enabled: true,
            led_pins: LedPins {
                red: 2,
                green: 3,
                white: 4,
                blue: 18,
            },
            pwm_frequency_hz: 5000.0,

            rf_pins: RfPins::default(),
            rf_wait_timeout_ms: 1000,

            adc: AdcConfig {
                bus: 0,
                slave_select: 0,
                clock_hz: 1_000_000,
            },
            panels: [
                PanelConfig {
                    enabled: false,
                    dimmer_channel: 0,
                    pager_pin: 8,
                    touch_pin: 25,
                    led_pin: 26,
                    speaker_pin: 12,
                    reset_pin: 7,
                },
                PanelConfig {
                    enabled: false,
                    dimmer_channel: 1,
                    pager_pin: 9,
                    touch_pin: 11,
                    led_pin: 6,
                    speaker_pin: 13,
                    reset_pin: 10,
                },
            ],
        }
    }
}

/// Environment keys for each panel, in [`PanelConfig`] field order.
const PANEL_ENV: [[&str; 7]; 2] = [
    [
        "PANEL1_ENABLED",
        "PANEL1_DIMMER_CHANNEL",
        "PANEL1_PAGER",
        "PANEL1_LIGHTS",
        "PANEL1_LED",
        "PANEL1_SPEAKER",
        "PANEL1_RESET",
    ],
    [
        "PANEL2_ENABLED",
        "PANEL2_DIMMER_CHANNEL",
        "PANEL2_PAGER",
        "PANEL2_LIGHTS",
        "PANEL2_LED",
        "PANEL2_SPEAKER",
        "PANEL2_RESET",
    ],
];

impl NodeConfig {
    /// Defaults, then the optional JSON file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a (possibly partial) JSON config; missing fields keep defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override fields from variables returned by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let env = EnvReader { lookup: &lookup };

        env.read("NODE_NAME", &mut self.node_name)?;
        env.read("LOG_LEVEL", &mut self.log_level)?;
        env.read("WAKEUP_DURATION_SECS", &mut self.wakeup_duration_secs)?;
        env.read("WAKEUP_TICK_SECS", &mut self.wakeup_tick_secs)?;

        env.read("FULL_POWER_RED", &mut self.full_power.red)?;
        env.read("FULL_POWER_GREEN", &mut self.full_power.green)?;
        env.read("FULL_POWER_WHITE", &mut self.full_power.white)?;
        env.read("FULL_POWER_BLUE", &mut self.full_power.blue)?;
        env.read("LOW_POWER_FRACTION", &mut self.low_power_fraction)?;

        env.read("LED_STRIP_ENABLED", &mut self.led_strip_enabled)?;
        env.read("LED_CTRL_RED", &mut self.led_pins.red)?;
        env.read("LED_CTRL_GREEN", &mut self.led_pins.green)?;
        env.read("LED_CTRL_WHITE", &mut self.led_pins.white)?;
        env.read("LED_CTRL_BLUE", &mut self.led_pins.blue)?;
        env.read("PWM_FREQUENCY_HZ", &mut self.pwm_frequency_hz)?;

        env.read("RF_LATCH_RESET", &mut self.rf_pins.reset)?;
        env.read("RF_CHANNEL_A", &mut self.rf_pins.a)?;
        env.read("RF_CHANNEL_B", &mut self.rf_pins.b)?;
        env.read("RF_CHANNEL_C", &mut self.rf_pins.c)?;
        env.read("RF_CHANNEL_D", &mut self.rf_pins.d)?;
        env.read("RF_WAIT_TIMEOUT_MS", &mut self.rf_wait_timeout_ms)?;

        env.read("ADC_SPI_BUS", &mut self.adc.bus)?;
        env.read("ADC_SPI_SLAVE", &mut self.adc.slave_select)?;
        env.read("ADC_SPI_CLOCK_HZ", &mut self.adc.clock_hz)?;

        for (panel, keys) in self.panels.iter_mut().zip(PANEL_ENV) {
            env.read(keys[0], &mut panel.enabled)?;
            env.read(keys[1], &mut panel.dimmer_channel)?;
            env.read(keys[2], &mut panel.pager_pin)?;
            env.read(keys[3], &mut panel.touch_pin)?;
            env.read(keys[4], &mut panel.led_pin)?;
            env.read(keys[5], &mut panel.speaker_pin)?;
            env.read(keys[6], &mut panel.reset_pin)?;
        }
        Ok(())
    }

    /// Validate that all fields are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::ValidationFailed(msg));

        if self.wakeup_duration_secs == 0 {
            return fail("wakeup_duration_secs must be non-zero".into());
        }
        if self.wakeup_tick_secs == 0 || self.wakeup_tick_secs > self.wakeup_duration_secs {
            return fail(format!(
                "wakeup_tick_secs must be in 1..={}",
                self.wakeup_duration_secs
            ));
        }
        if !(0.0..=1.0).contains(&self.low_power_fraction) {
            return fail(format!(
                "low_power_fraction {} not in 0.0-1.0",
                self.low_power_fraction
            ));
        }
        let mix = self.full_power;
        if [mix.red, mix.green, mix.white, mix.blue]
            .iter()
            .any(|p| !(0.0..=100.0).contains(p))
        {
            return fail("full_power channels must be 0-100%".into());
        }
        if self.pwm_frequency_hz.is_nan() || self.pwm_frequency_hz <= 0.0 {
            return fail("pwm_frequency_hz must be positive".into());
        }
        if self.rf_wait_timeout_ms == 0 {
            return fail("rf_wait_timeout_ms must be non-zero".into());
        }
        for (n, panel) in self.enabled_panels() {
            if panel.dimmer_channel >= 8 {
                return fail(format!("panel {n}: dimmer channel {} > 7", panel.dimmer_channel));
            }
        }

        let mut claimed: Vec<u8> = Vec::new();
        let mut claim = |pin: u8| {
            if claimed.contains(&pin) {
                return fail(format!("gpio {pin} is assigned twice"));
            }
            claimed.push(pin);
            Ok(())
        };
        for pin in self.rf_pins.all() {
            claim(pin)?;
        }
        if self.led_strip_enabled {
            for channel in Channel::ALL {
                claim(self.led_pins.pin(channel))?;
            }
        }
        for (_, panel) in self.enabled_panels() {
            for pin in panel.pins() {
                claim(pin)?;
            }
        }
        Ok(())
    }

    /// Enabled panels with their 1-based number.
    pub fn enabled_panels(&self) -> impl Iterator<Item = (u8, &PanelConfig)> {
        (1u8..)
            .zip(self.panels.iter())
            .filter(|(_, p)| p.enabled)
    }

    pub fn light_settings(&self) -> Result<LightSettings, LightError> {
        LightSettings::new(self.full_power.to_mix(), self.low_power_fraction)
    }

    pub fn ramp_config(&self) -> RampConfig {
        RampConfig {
            duration: Duration::from_secs(self.wakeup_duration_secs),
            tick: Duration::from_secs(self.wakeup_tick_secs),
        }
    }

    pub fn rf_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.rf_wait_timeout_ms)
    }
}

struct EnvReader<'a, F> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<'_, F> {
    fn read<T: FromStr>(&self, key: &'static str, field: &mut T) -> Result<(), ConfigError> {
        let Some(value) = (self.lookup)(key) else {
            return Ok(());
        };
        *field = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key, value })?;
        Ok(())
    }
}
