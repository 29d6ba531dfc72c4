//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Tolerances must be positive")]
    InvalidTolerance,

    #[error("Acceptable consistency ratio must be in (0, 1]")]
    InvalidAcceptableRatio,

    #[error("Limit '{0}' is out of range")]
    InvalidLimit(&'static str),
}
