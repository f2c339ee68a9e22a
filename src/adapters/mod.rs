//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements              | Connects to                  |
//! |------------|-------------------------|------------------------------|
//! | `log_sink` | EventSink               | `log` output                 |
//! |            | PagerNotifier           | `log` output                 |
//! | `time`     | Clock, DelayNs          | `std::time`, `thread::sleep` |
//! | `rpi`      | GpioBank, LightOutput   | rppal GPIO / PWM             |
//! |            | Speaker, AnalogInput    | rppal PWM / SPI (MCP3008)    |

pub mod log_sink;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod time;
