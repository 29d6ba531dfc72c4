//! Consistency, hierarchy and sensitivity configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Consistency ratio policy
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ConsistencyConfig {
    /// Largest consistency ratio still considered acceptable
    #[serde(default = "default_acceptable_ratio")]
    pub acceptable_ratio: f64,
}

impl ConsistencyConfig {
    /// Validate consistency configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.acceptable_ratio > 0.0 && self.acceptable_ratio <= 1.0) {
            return Err(ValidationError::InvalidAcceptableRatio);
        }
        Ok(())
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            acceptable_ratio: default_acceptable_ratio(),
        }
    }
}

/// Criteria hierarchy limits
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HierarchyConfig {
    /// Deepest level a criterion may sit at (goal excluded)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Allowed deviation of a sibling group's local weights from 1
    #[serde(default = "default_weight_sum_tolerance")]
    pub weight_sum_tolerance: f64,
}

impl HierarchyConfig {
    /// Validate hierarchy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_depth == 0 {
            return Err(ValidationError::InvalidLimit("hierarchy.max_depth"));
        }
        if !(self.weight_sum_tolerance > 0.0) {
            return Err(ValidationError::InvalidTolerance);
        }
        Ok(())
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            weight_sum_tolerance: default_weight_sum_tolerance(),
        }
    }
}

/// Sensitivity sweep limits
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SensitivityConfig {
    /// Most weight values a single sweep may request
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl SensitivityConfig {
    /// Validate sensitivity configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_steps == 0 {
            return Err(ValidationError::InvalidLimit("sensitivity.max_steps"));
        }
        Ok(())
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

fn default_acceptable_ratio() -> f64 {
    0.10
}

fn default_max_depth() -> usize {
    5
}

fn default_weight_sum_tolerance() -> f64 {
    1e-6
}

fn default_max_steps() -> usize {
    1_000
}
