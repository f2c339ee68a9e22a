//! Light domain types: pure values, zero I/O.
//!
//! ```text
//!   ChannelLevel ──▶ LightState ──▶ LightSettings (presets)
//! ```
//!
//! Nothing in here knows about threads or hardware.  The
//! [`LightController`](crate::app::controller::LightController) is the only
//! component that holds a live [`LightState`]; everything else builds
//! candidate states from these types and hands them over.

pub mod level;
pub mod settings;
pub mod state;

pub use level::ChannelLevel;
pub use settings::LightSettings;
pub use state::{Channel, ChannelMix, LightName, LightState};
