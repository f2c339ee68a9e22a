//! Unified error types for the lighting node.
//!
//! Each hardware concern has its own small error type so call sites can
//! decide locally whether a failure is fatal (construction) or merely a
//! skipped cycle (writes, edge reads).  Everything converts into the
//! crate-wide [`Error`] for callers that just want to propagate.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A required hardware line could not be acquired or configured.
    #[error(transparent)]
    Init(#[from] InitError),
    /// A write to an output (LED channel, reset line, speaker) failed.
    #[error(transparent)]
    Drive(#[from] DriveError),
    /// Waiting for an edge on an input line failed.
    #[error(transparent)]
    EdgeRead(#[from] EdgeReadError),
    /// Light settings were rejected.
    #[error(transparent)]
    Light(#[from] LightError),
    /// Configuration is invalid or could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Hardware line errors
// ---------------------------------------------------------------------------

/// Low-level failure reported by a [`GpioBank`](crate::app::ports::GpioBank)
/// or analog backend.  Backend errors are kept as boxed sources so the
/// domain layer does not depend on any particular GPIO library.
#[derive(Debug, Error)]
pub enum LineError {
    /// The line is already claimed by another consumer.
    #[error("line {0} is busy")]
    Busy(u8),
    /// The line number does not exist on this chip.
    #[error("line {0} does not exist")]
    NoSuchLine(u8),
    /// Any other backend failure.
    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A required line could not be acquired or configured.  Names the first
/// failing line; no partially constructed component is ever returned.
#[derive(Debug, Error)]
#[error("failed to initialise {line} line (gpio {pin}): {source}")]
pub struct InitError {
    /// Logical name of the line, e.g. `"reset"` or `"channel A"`.
    pub line: &'static str,
    /// Physical line number.
    pub pin: u8,
    #[source]
    pub source: LineError,
}

/// A write to an output failed.  Logged and skipped; never fatal.
#[derive(Debug, Error)]
#[error("write to {target} failed: {reason}")]
pub struct DriveError {
    /// What was being driven, e.g. `"red"`, `"latch reset"`, `"speaker"`.
    pub target: &'static str,
    pub reason: String,
}

impl DriveError {
    pub fn new(target: &'static str, reason: impl ToString) -> Self {
        Self {
            target,
            reason: reason.to_string(),
        }
    }
}

/// Waiting for an edge failed.  Treated exactly like a missed edge.
#[derive(Debug, Error)]
#[error("edge read on {line} failed: {reason}")]
pub struct EdgeReadError {
    pub line: String,
    pub reason: String,
}

impl EdgeReadError {
    pub fn new(line: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            line: line.into(),
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings / configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LightError {
    /// The low-power multiplier must be a fraction of full power.
    #[error("invalid power multiplier {0} - valid range 0.0-1.0")]
    InvalidMultiplier(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field failed range validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// An environment variable could not be parsed.
    #[error("environment variable {key}={value:?} is not valid")]
    InvalidEnv { key: &'static str, value: String },
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for [`NodeConfig`](crate::config::NodeConfig).
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
