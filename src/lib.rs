//! Wakelight node library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! node binary.  Raspberry Pi specific code lives in
//! [`adapters::rpi`] behind the `rpi` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cancel;
pub mod config;
pub mod error;
pub mod light;
pub mod panel;
pub mod rf;
