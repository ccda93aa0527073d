//! Engine-level error type.

use thiserror::Error;

/// Failures reported by the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Every node slot is in use.
    #[error("node capacity exhausted")]
    NodeCapacityExhausted,
    /// The update thread is gone; the engine is stopped.
    #[error("engine is not running")]
    NotRunning,
    /// Malformed configuration document.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
