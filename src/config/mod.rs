//! Engine configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! (and optionally a file) using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `AHP_ENGINE` prefix and nested values use double underscores as
//! separators. Every section has documented defaults, so an empty environment
//! yields a usable configuration.
//!
//! # Example
//!
//! ```no_run
//! use ahp_engine::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Acceptable CR: {}", config.consistency.acceptable_ratio);
//! ```

mod analysis;
mod budget;
mod error;
mod matrix;
mod telemetry;

pub use analysis::{ConsistencyConfig, HierarchyConfig, SensitivityConfig};
pub use budget::BudgetConfig;
pub use error::{ConfigError, ValidationError};
pub use matrix::MatrixConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;
use std::path::Path;

/// Root engine configuration
///
/// Each section is injected into the component that needs it; nothing in the
/// engine reads configuration from global state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    /// Comparison matrix tolerances and size limit
    #[serde(default)]
    pub matrix: MatrixConfig,

    /// Consistency ratio policy
    #[serde(default)]
    pub consistency: ConsistencyConfig,

    /// Hierarchy depth and weight tolerances
    #[serde(default)]
    pub hierarchy: HierarchyConfig,

    /// Sensitivity sweep limits
    #[serde(default)]
    pub sensitivity: SensitivityConfig,

    /// Budget optimizer limits
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AnalysisConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AHP_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `AHP_ENGINE__CONSISTENCY__ACCEPTABLE_RATIO=0.15` -> `consistency.acceptable_ratio = 0.15`
    /// - `AHP_ENGINE__BUDGET__MAX_DP_CELLS=200000` -> `budget.max_dp_cells = 200000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load configuration from a file, with environment variables layered on top
    ///
    /// The file format (TOML, JSON, YAML) is inferred from the extension.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    fn environment() -> config::Environment {
        config::Environment::default()
            .prefix("AHP_ENGINE")
            .separator("__")
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.matrix.validate()?;
        self.consistency.validate()?;
        self.hierarchy.validate()?;
        self.sensitivity.validate()?;
        self.budget.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("AHP_ENGINE__CONSISTENCY__ACCEPTABLE_RATIO");
        env::remove_var("AHP_ENGINE__BUDGET__MAX_DP_CELLS");
        env::remove_var("AHP_ENGINE__HIERARCHY__MAX_DEPTH");
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.consistency.acceptable_ratio, 0.10);
        assert_eq!(config.hierarchy.max_depth, 5);
        assert_eq!(config.budget.max_dp_cells, 100_000);
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AnalysisConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.matrix.max_size, 15);
        assert_eq!(config.sensitivity.max_steps, 1_000);
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("AHP_ENGINE__CONSISTENCY__ACCEPTABLE_RATIO", "0.15");
        env::set_var("AHP_ENGINE__BUDGET__MAX_DP_CELLS", "250000");
        let result = AnalysisConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.consistency.acceptable_ratio, 0.15);
        assert_eq!(config.budget.max_dp_cells, 250_000);
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[hierarchy]\nmax_depth = 3\n\n[budget]\nmax_items = 50").unwrap();

        let config = AnalysisConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.hierarchy.max_depth, 3);
        assert_eq!(config.budget.max_items, 50);
        assert_eq!(config.budget.max_dp_cells, 100_000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("AHP_ENGINE__HIERARCHY__MAX_DEPTH", "4");

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[hierarchy]\nmax_depth = 2").unwrap();

        let result = AnalysisConfig::load_from_path(file.path());
        clear_env();

        assert_eq!(result.unwrap().hierarchy.max_depth, 4);
    }

    #[test]
    fn test_validate_reports_first_invalid_section() {
        let mut config = AnalysisConfig::default();
        config.consistency.acceptable_ratio = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidAcceptableRatio)
        ));
    }
}
