//! Application core: domain logic behind port traits.
//!
//! The [`controller::LightController`] owns the fixture: every light
//! change, ramp session and colour setting goes through it.  All
//! interaction with hardware happens through the **port traits** in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
