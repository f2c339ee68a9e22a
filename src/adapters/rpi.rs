//! Raspberry Pi hardware adapter (rppal).
//!
//! The only module that touches real peripherals.  Compiled with the
//! `rpi` feature; host builds and tests use the mock adapters instead.
//!
//! | Type             | Implements            | Peripheral                    |
//! |------------------|-----------------------|-------------------------------|
//! | `RpiGpio`        | GpioBank              | BCM GPIO character device     |
//! | `RpiOutput`      | embedded-hal OutputPin| plain GPIO output             |
//! | `RpiEdgeInput`   | EdgeInput             | GPIO input, rising interrupt  |
//! | `PwmLightOutput` | LightOutput           | 4 × software PWM LED channels |
//! | `PwmSpeaker`     | Speaker               | software PWM square wave      |
//! | `Mcp3008`        | AnalogInput           | MCP3008 ADC on SPI            |

use std::convert::Infallible;
use std::time::Duration;

use embedded_hal::digital as hal;
use log::{debug, info};
use rppal::gpio::{self, Gpio, Trigger};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::app::ports::{AnalogInput, EdgeInput, GpioBank, LightOutput, Speaker};
use crate::config::{AdcConfig, LedPins};
use crate::error::{DriveError, EdgeReadError, InitError, LineError};
use crate::light::{Channel, LightState};

fn backend<E: std::error::Error + Send + Sync + 'static>(e: E) -> LineError {
    LineError::Backend(Box::new(e))
}

fn line_error(pin: u8) -> impl FnOnce(gpio::Error) -> LineError {
    move |e| match e {
        gpio::Error::PinUsed(_) => LineError::Busy(pin),
        other => backend(other),
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO bank
// ───────────────────────────────────────────────────────────────

pub struct RpiGpio {
    gpio: Gpio,
}

impl RpiGpio {
    pub fn new() -> Result<Self, LineError> {
        let gpio = Gpio::new().map_err(backend)?;
        Ok(Self { gpio })
    }

    /// Claim `pin` as a raw rppal output (for software PWM), driven low.
    pub fn claim_pwm_output(&mut self, pin: u8) -> Result<gpio::OutputPin, LineError> {
        Ok(self.gpio.get(pin).map_err(line_error(pin))?.into_output_low())
    }
}

impl GpioBank for RpiGpio {
    type Output = RpiOutput;
    type Input = RpiEdgeInput;

    fn claim_output_low(&mut self, pin: u8) -> Result<RpiOutput, LineError> {
        self.claim_pwm_output(pin).map(RpiOutput)
    }

    fn claim_rising_edge_input(&mut self, pin: u8) -> Result<RpiEdgeInput, LineError> {
        let mut input = self.gpio.get(pin).map_err(line_error(pin))?.into_input();
        input
            .set_interrupt(Trigger::RisingEdge)
            .map_err(line_error(pin))?;
        Ok(RpiEdgeInput { input })
    }
}

// ───────────────────────────────────────────────────────────────
// Digital lines
// ───────────────────────────────────────────────────────────────

/// rppal output exposed through the embedded-hal trait.  rppal writes
/// cannot fail once the pin is claimed.
pub struct RpiOutput(gpio::OutputPin);

impl hal::ErrorType for RpiOutput {
    type Error = Infallible;
}

impl hal::OutputPin for RpiOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set_high();
        Ok(())
    }
}

pub struct RpiEdgeInput {
    input: gpio::InputPin,
}

impl EdgeInput for RpiEdgeInput {
    fn line(&self) -> u8 {
        self.input.pin()
    }

    fn wait_for_rising_edge(&mut self, timeout: Duration) -> Result<bool, EdgeReadError> {
        // Keep pending events: an edge between two waits must still count.
        match self.input.poll_interrupt(false, Some(timeout)) {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(e) => Err(EdgeReadError::new(format!("gpio {}", self.input.pin()), e)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LED strip
// ───────────────────────────────────────────────────────────────

/// Four software-PWM channels.  A zero channel stops PWM and holds the
/// line low.
pub struct PwmLightOutput {
    channels: [(Channel, gpio::OutputPin); 4],
    frequency_hz: f64,
}

impl PwmLightOutput {
    pub fn new(gpio: &mut RpiGpio, pins: &LedPins, frequency_hz: f64) -> Result<Self, InitError> {
        let mut claim = |channel: Channel| {
            let pin = pins.pin(channel);
            gpio.claim_pwm_output(pin).map_err(|source| InitError {
                line: channel.label(),
                pin,
                source,
            })
        };
        let channels = [
            (Channel::Red, claim(Channel::Red)?),
            (Channel::Green, claim(Channel::Green)?),
            (Channel::White, claim(Channel::White)?),
            (Channel::Blue, claim(Channel::Blue)?),
        ];
        info!(
            "LED strip on gpio r={} g={} w={} b={} at {} Hz",
            pins.red, pins.green, pins.white, pins.blue, frequency_hz
        );
        Ok(Self {
            channels,
            frequency_hz,
        })
    }
}

impl LightOutput for PwmLightOutput {
    fn apply(&mut self, state: &LightState) -> Result<(), DriveError> {
        let mut first_failure = None;
        for (channel, pin) in &mut self.channels {
            let level = state.level(*channel);
            let written = if level.is_off() {
                pin.clear_pwm().map(|()| pin.set_low())
            } else {
                pin.set_pwm_frequency(self.frequency_hz, level.fraction())
            };
            if let Err(e) = written {
                if first_failure.is_none() {
                    first_failure = Some(DriveError::new(channel.label(), e));
                }
            }
        }
        debug!("LED strip <- {state}");
        first_failure.map_or(Ok(()), Err)
    }
}

// ───────────────────────────────────────────────────────────────
// Speaker
// ───────────────────────────────────────────────────────────────

pub struct PwmSpeaker(gpio::OutputPin);

impl PwmSpeaker {
    pub fn new(gpio: &mut RpiGpio, pin: u8) -> Result<Self, InitError> {
        gpio.claim_pwm_output(pin)
            .map(Self)
            .map_err(|source| InitError {
                line: "speaker",
                pin,
                source,
            })
    }
}

impl Speaker for PwmSpeaker {
    fn tone(&mut self, hz: u32) -> Result<(), DriveError> {
        self.0
            .set_pwm_frequency(f64::from(hz), 0.5)
            .map_err(|e| DriveError::new("speaker", e))
    }

    fn silence(&mut self) -> Result<(), DriveError> {
        let stopped = self.0.clear_pwm();
        self.0.set_low();
        stopped.map_err(|e| DriveError::new("speaker", e))
    }
}

// ───────────────────────────────────────────────────────────────
// MCP3008 ADC
// ───────────────────────────────────────────────────────────────

/// 8-channel 10-bit SPI ADC carrying the panel dimmer knobs.
pub struct Mcp3008 {
    spi: Spi,
}

impl Mcp3008 {
    pub const CHANNELS: u8 = 8;

    pub fn new(config: &AdcConfig) -> Result<Self, LineError> {
        let bus = match config.bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(LineError::NoSuchLine(other)),
        };
        let slave = match config.slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(LineError::NoSuchLine(other)),
        };
        let spi = Spi::new(bus, slave, config.clock_hz, Mode::Mode0).map_err(backend)?;
        info!(
            "MCP3008 ADC on SPI{}.{} at {} Hz",
            config.bus, config.slave_select, config.clock_hz
        );
        Ok(Self { spi })
    }
}

impl AnalogInput for Mcp3008 {
    fn read_channel(&mut self, channel: u8) -> Result<u16, LineError> {
        if channel >= Self::CHANNELS {
            return Err(LineError::NoSuchLine(channel));
        }
        // Start bit, single-ended mode + channel, then clock out 10 bits.
        let tx = [0x01, (0x08 | channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi.transfer(&mut rx, &tx).map_err(backend)?;
        Ok((u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]))
    }
}
