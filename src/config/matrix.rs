//! Comparison matrix validation configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tolerances and limits applied by the matrix validator
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatrixConfig {
    /// Allowed absolute deviation of a diagonal entry from 1
    #[serde(default = "default_diagonal_tolerance")]
    pub diagonal_tolerance: f64,

    /// Allowed relative deviation of `a[i][j] * a[j][i]` from 1
    #[serde(default = "default_reciprocity_tolerance")]
    pub reciprocity_tolerance: f64,

    /// Largest accepted matrix dimension
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Emit a warning for judgments outside Saaty's 1/9..9 scale
    #[serde(default = "default_warn_outside_saaty_scale")]
    pub warn_outside_saaty_scale: bool,
}

impl MatrixConfig {
    /// Validate matrix configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.diagonal_tolerance > 0.0) || !(self.reciprocity_tolerance > 0.0) {
            return Err(ValidationError::InvalidTolerance);
        }
        if self.max_size == 0 {
            return Err(ValidationError::InvalidLimit("matrix.max_size"));
        }
        Ok(())
    }
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            diagonal_tolerance: default_diagonal_tolerance(),
            reciprocity_tolerance: default_reciprocity_tolerance(),
            max_size: default_max_size(),
            warn_outside_saaty_scale: default_warn_outside_saaty_scale(),
        }
    }
}

fn default_diagonal_tolerance() -> f64 {
    1e-6
}

fn default_reciprocity_tolerance() -> f64 {
    1e-3
}

fn default_max_size() -> usize {
    15
}

fn default_warn_outside_saaty_scale() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_config_defaults() {
        let config = MatrixConfig::default();
        assert_eq!(config.diagonal_tolerance, 1e-6);
        assert_eq!(config.reciprocity_tolerance, 1e-3);
        assert_eq!(config.max_size, 15);
        assert!(config.warn_outside_saaty_scale);
    }

    #[test]
    fn test_validation_rejects_zero_tolerance() {
        let config = MatrixConfig {
            reciprocity_tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_nan_tolerance() {
        let config = MatrixConfig {
            diagonal_tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_max_size() {
        let config = MatrixConfig {
            max_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
