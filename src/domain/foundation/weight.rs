//! Evaluator weight value object (relative trust in group aggregation).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A strictly positive, finite influence weight for one evaluator.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EvaluatorWeight(f64);

impl EvaluatorWeight {
    /// Neutral weight assigned when the caller supplies none.
    pub const DEFAULT: Self = Self(1.0);

    /// Lower end of the recommended range.
    pub const RECOMMENDED_MIN: f64 = 0.1;

    /// Upper end of the recommended range.
    pub const RECOMMENDED_MAX: f64 = 10.0;

    /// Creates an EvaluatorWeight, returning error if not positive and finite.
    pub fn try_new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::out_of_range(
                "evaluator_weight",
                0.0,
                f64::MAX,
                value,
            ));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns true if the weight lies within the recommended 0.1–10 band.
    pub fn is_recommended(&self) -> bool {
        (Self::RECOMMENDED_MIN..=Self::RECOMMENDED_MAX).contains(&self.0)
    }
}

impl Default for EvaluatorWeight {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for EvaluatorWeight {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<EvaluatorWeight> for f64 {
    fn from(weight: EvaluatorWeight) -> Self {
        weight.0
    }
}

impl fmt::Display for EvaluatorWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "×{}", self.0)
    }
}
