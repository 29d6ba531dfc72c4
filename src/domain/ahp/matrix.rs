//! Comparison Matrix - raw judgment input, validated matrix and the validator.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::MatrixConfig;
use crate::domain::foundation::{AnalysisError, MatrixDefect};

/// Smallest judgment on Saaty's fundamental scale.
pub const SAATY_MIN: f64 = 1.0 / 9.0;

/// Largest judgment on Saaty's fundamental scale.
pub const SAATY_MAX: f64 = 9.0;

/// Raw pairwise judgments as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixInput {
    /// Ordered element labels (criteria or alternative ids).
    pub elements: Vec<String>,
    /// Row-major n×n grid; `matrix[i][j]` is how strongly `i` is preferred over `j`.
    pub matrix: Vec<Vec<f64>>,
}

impl MatrixInput {
    /// Creates an input from labels and a full grid.
    pub fn new(elements: Vec<impl Into<String>>, matrix: Vec<Vec<f64>>) -> Self {
        Self {
            elements: elements.into_iter().map(|s| s.into()).collect(),
            matrix,
        }
    }

    /// Builds a full grid from the strict upper triangle, row by row.
    ///
    /// For three elements the judgments are `[a01, a02, a12]`. The diagonal is
    /// set to 1 and the lower triangle to the reciprocals.
    pub fn from_upper_triangle(
        elements: Vec<impl Into<String>>,
        judgments: &[f64],
    ) -> Result<Self, AnalysisError> {
        let elements: Vec<String> = elements.into_iter().map(|s| s.into()).collect();
        let n = elements.len();
        if n == 0 {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::Empty));
        }
        if judgments.len() != n * (n - 1) / 2 {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::LabelMismatch));
        }

        let mut matrix = vec![vec![1.0; n]; n];
        let mut next = judgments.iter();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(&value) = next.next() {
                    matrix[i][j] = value;
                    matrix[j][i] = 1.0 / value;
                }
            }
        }

        Ok(Self { elements, matrix })
    }

    /// Builds a perfectly consistent grid `a[i][j] = w[i] / w[j]` from direct
    /// numeric weights.
    pub fn from_priorities(
        elements: Vec<impl Into<String>>,
        weights: &[f64],
    ) -> Result<Self, AnalysisError> {
        let elements: Vec<String> = elements.into_iter().map(|s| s.into()).collect();
        if elements.len() != weights.len() {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::LabelMismatch));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::NonFiniteEntry));
        }
        if weights.iter().any(|w| *w <= 0.0) {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::NonPositiveEntry));
        }

        let matrix = weights
            .iter()
            .map(|wi| weights.iter().map(|wj| wi / wj).collect())
            .collect();

        Ok(Self { elements, matrix })
    }
}

/// A square, reciprocal, strictly positive comparison matrix.
///
/// Only obtainable through [`MatrixValidator::validate`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMatrix {
    elements: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl ComparisonMatrix {
    /// Returns the matrix dimension.
    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Returns the ordered element labels.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Returns the entry at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Returns row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i]
    }

    /// Returns all rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }
}

/// Non-fatal findings raised while validating a matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MatrixWarning {
    /// `a[row][column]` was rewritten as the reciprocal of its mirror entry.
    ReciprocityRepaired { row: usize, column: usize },
    /// A diagonal entry deviated from 1 and was reset.
    DiagonalCorrected { index: usize },
    /// A judgment falls outside the 1/9..9 scale.
    OutsideSaatyScale { row: usize, column: usize, value: f64 },
}

/// A validated matrix together with the warnings raised along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedMatrix {
    pub matrix: ComparisonMatrix,
    pub warnings: Vec<MatrixWarning>,
}

impl ValidatedMatrix {
    /// Returns true if validation needed to repair the input.
    pub fn was_repaired(&self) -> bool {
        self.warnings.iter().any(|w| {
            matches!(
                w,
                MatrixWarning::ReciprocityRepaired { .. } | MatrixWarning::DiagonalCorrected { .. }
            )
        })
    }
}

/// Validates the structural invariants of a comparison matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixValidator {
    config: MatrixConfig,
}

impl MatrixValidator {
    /// Creates a validator with the given tolerances.
    pub fn new(config: MatrixConfig) -> Self {
        Self { config }
    }

    /// Validates and, where possible, repairs a raw matrix.
    ///
    /// # Checks (in order)
    /// 1. Square, and the label count matches the size
    /// 2. At least one element (and no more than the configured maximum)
    /// 3. Diagonal equals 1 (reset with a warning otherwise)
    /// 4. Reciprocity within relative tolerance (mirror entry rewritten with a
    ///    warning otherwise; the upper triangle wins when both sides are usable)
    /// 5. Every entry finite and strictly positive
    ///
    /// Only 1, 2 and 5 fail.
    pub fn validate(&self, input: &MatrixInput) -> Result<ValidatedMatrix, AnalysisError> {
        let n = input.matrix.len();

        if input.matrix.iter().any(|row| row.len() != n) {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::NotSquare));
        }
        if input.elements.len() != n {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::LabelMismatch));
        }
        if n == 0 {
            return Err(AnalysisError::invalid_matrix(MatrixDefect::Empty));
        }
        if n > self.config.max_size {
            return Err(AnalysisError::SizeLimitExceeded {
                what: "matrix size",
                limit: self.config.max_size,
                actual: n,
            });
        }

        let mut values = input.matrix.clone();
        let mut warnings = Vec::new();

        for (i, row) in values.iter_mut().enumerate() {
            if !((row[i] - 1.0).abs() <= self.config.diagonal_tolerance) {
                row[i] = 1.0;
                warnings.push(MatrixWarning::DiagonalCorrected { index: i });
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let upper = values[i][j];
                let lower = values[j][i];
                if (upper * lower - 1.0).abs() <= self.config.reciprocity_tolerance {
                    continue;
                }
                if is_usable(upper) {
                    values[j][i] = 1.0 / upper;
                    warnings.push(MatrixWarning::ReciprocityRepaired { row: j, column: i });
                } else if is_usable(lower) {
                    values[i][j] = 1.0 / lower;
                    warnings.push(MatrixWarning::ReciprocityRepaired { row: i, column: j });
                }
            }
        }

        for row in &values {
            for &value in row {
                if !value.is_finite() {
                    return Err(AnalysisError::invalid_matrix(MatrixDefect::NonFiniteEntry));
                }
                if value <= 0.0 {
                    return Err(AnalysisError::invalid_matrix(MatrixDefect::NonPositiveEntry));
                }
            }
        }

        if self.config.warn_outside_saaty_scale {
            for i in 0..n {
                for j in (i + 1)..n {
                    let value = values[i][j];
                    if value < SAATY_MIN * (1.0 - 1e-9) || value > SAATY_MAX * (1.0 + 1e-9) {
                        warnings.push(MatrixWarning::OutsideSaatyScale {
                            row: i,
                            column: j,
                            value,
                        });
                    }
                }
            }
        }

        let repaired = warnings
            .iter()
            .filter(|w| !matches!(w, MatrixWarning::OutsideSaatyScale { .. }))
            .count();
        if repaired > 0 {
            warn!(
                size = n,
                repaired,
                "Repaired comparison matrix entries during validation"
            );
        }

        Ok(ValidatedMatrix {
            matrix: ComparisonMatrix {
                elements: input.elements.clone(),
                values,
            },
            warnings,
        })
    }
}

fn is_usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
