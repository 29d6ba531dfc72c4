//! Tracing subscriber setup for hosts embedding the engine.
//!
//! The engine itself only emits events through `tracing`; installing a
//! subscriber is left to the host. This helper covers the common case.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TelemetryConfig;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Logs go to stderr,
/// as JSON lines when `config.json` is set.
///
/// # Errors
///
/// Returns `TelemetryError` if the filter does not parse or a subscriber is
/// already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            TelemetryError::InvalidFilter {
                filter: config.log_level.clone(),
                reason: e.to_string(),
            }
        })?,
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|_| TelemetryError::AlreadyInstalled)
}
