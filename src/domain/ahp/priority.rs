//! Priority Deriver - Row geometric mean approximation of the principal eigenvector.

use serde::Serialize;

use super::ComparisonMatrix;
use crate::domain::foundation::{all_non_negative, AnalysisError, WEIGHT_SUM_TOLERANCE};

/// Normalized weights indexed like the elements of their source matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityVector {
    elements: Vec<String>,
    weights: Vec<f64>,
}

impl PriorityVector {
    /// Creates a priority vector, checking that weights are non-negative and sum to 1.
    pub fn try_new(elements: Vec<String>, weights: Vec<f64>) -> Result<Self, AnalysisError> {
        if elements.is_empty() {
            return Err(AnalysisError::invalid_priorities("vector is empty"));
        }
        if elements.len() != weights.len() {
            return Err(AnalysisError::invalid_priorities(format!(
                "{} labels for {} weights",
                elements.len(),
                weights.len()
            )));
        }
        if !all_non_negative(&weights) {
            return Err(AnalysisError::invalid_priorities(
                "weights must be finite and non-negative",
            ));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::invalid_priorities(format!(
                "weights sum to {} instead of 1",
                total
            )));
        }
        Ok(Self { elements, weights })
    }

    /// Returns the element labels.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Returns the weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Returns the weight of a labelled element.
    pub fn weight_of(&self, element: &str) -> Option<f64> {
        self.elements
            .iter()
            .position(|e| e == element)
            .map(|i| self.weights[i])
    }

    /// Iterates over `(label, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.elements
            .iter()
            .map(|e| e.as_str())
            .zip(self.weights.iter().copied())
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns true if the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Derives priority vectors from validated comparison matrices.
pub struct PriorityDeriver;

impl PriorityDeriver {
    /// Computes the normalized row geometric means of the matrix.
    ///
    /// # Algorithm
    /// `g[i] = (∏_j a[i][j])^(1/n)`, `w[i] = g[i] / Σg`
    ///
    /// Products are accumulated as sums of logarithms and shifted by the largest
    /// row mean before exponentiating, so large matrices cannot overflow.
    ///
    /// # Edge Cases
    /// - 1×1 matrix: returns `[1.0]`
    pub fn derive(matrix: &ComparisonMatrix) -> PriorityVector {
        let n = matrix.size();
        let elements = matrix.elements().to_vec();

        if n == 1 {
            return PriorityVector {
                elements,
                weights: vec![1.0],
            };
        }

        let log_means: Vec<f64> = matrix
            .rows()
            .iter()
            .map(|row| row.iter().map(|a| a.ln()).sum::<f64>() / n as f64)
            .collect();
        let shift = log_means.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let geometric: Vec<f64> = log_means.iter().map(|m| (m - shift).exp()).collect();
        // The largest term is exactly 1, so the total is at least 1
        let total: f64 = geometric.iter().sum();

        PriorityVector {
            elements,
            weights: geometric.iter().map(|g| g / total).collect(),
        }
    }
}
