//! Consistency Evaluator - Saaty consistency index and ratio.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::{ComparisonMatrix, PriorityDeriver, PriorityVector};
use crate::config::ConsistencyConfig;
use crate::domain::foundation::AnalysisError;

/// Saaty's random index by matrix size (index 0 unused).
pub const RANDOM_INDEX: [f64; 16] = [
    0.0, 0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.48, 1.56, 1.57, 1.59,
];

/// Returns the random index for an n×n matrix.
///
/// Sizes beyond the published table use the n = 15 value.
pub fn random_index(n: usize) -> f64 {
    RANDOM_INDEX[n.min(RANDOM_INDEX.len() - 1)]
}

/// Consistency measures for one comparison matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub consistency_index: f64,
    pub consistency_ratio: f64,
    pub random_index: f64,
    pub lambda_max: f64,
    pub is_acceptable: bool,
    pub matrix_size: usize,
}

/// A judgment that contributes strongly to inconsistency, with the value
/// that would agree with the derived priorities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentRevision {
    pub row_element: String,
    pub column_element: String,
    pub current: f64,
    pub suggested: f64,
    /// `|ln(a[i][j] · w[j] / w[i])|`; zero for a perfectly consistent judgment.
    pub deviation: f64,
}

/// Computes consistency reports against an injected acceptability threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyEvaluator {
    config: ConsistencyConfig,
}

impl ConsistencyEvaluator {
    /// Creates an evaluator with the given policy.
    pub fn new(config: ConsistencyConfig) -> Self {
        Self { config }
    }

    /// Computes CI, CR and λmax for a matrix and its priority vector.
    ///
    /// # Algorithm
    /// - `λmax = mean_i((Aw)[i] / w[i])`
    /// - `CI = (λmax - n) / (n - 1)` for n ≥ 3, else 0
    /// - `CR = CI / RI[n]`
    ///
    /// # Errors
    /// `InvalidPriorityVector` if the vector does not match the matrix or has a
    /// zero weight (λmax would be undefined).
    pub fn evaluate(
        &self,
        matrix: &ComparisonMatrix,
        priorities: &PriorityVector,
    ) -> Result<ConsistencyReport, AnalysisError> {
        Self::check_alignment(matrix, priorities)?;
        Ok(self.compute(matrix, priorities.weights()))
    }

    /// Derives priorities and evaluates them in one step.
    pub fn assess(&self, matrix: &ComparisonMatrix) -> (PriorityVector, ConsistencyReport) {
        let priorities = PriorityDeriver::derive(matrix);
        let report = self.compute(matrix, priorities.weights());
        (priorities, report)
    }

    // Callers guarantee `w` aligns with the matrix and is strictly positive.
    fn compute(&self, matrix: &ComparisonMatrix, w: &[f64]) -> ConsistencyReport {
        let n = matrix.size();

        let lambda_max = matrix
            .rows()
            .iter()
            .zip(w)
            .map(|(row, wi)| {
                let aw: f64 = row.iter().zip(w).map(|(a, wj)| a * wj).sum();
                aw / wi
            })
            .sum::<f64>()
            / n as f64;

        let (consistency_index, consistency_ratio) = if n < 3 {
            (0.0, 0.0)
        } else {
            let ci = ((lambda_max - n as f64) / (n as f64 - 1.0)).max(0.0);
            (ci, ci / random_index(n))
        };

        let is_acceptable = consistency_ratio <= self.config.acceptable_ratio;
        if !is_acceptable {
            debug!(
                size = n,
                consistency_ratio,
                threshold = self.config.acceptable_ratio,
                "Comparison matrix exceeds acceptable inconsistency"
            );
        }

        ConsistencyReport {
            consistency_index,
            consistency_ratio,
            random_index: random_index(n),
            lambda_max,
            is_acceptable,
            matrix_size: n,
        }
    }

    /// Ranks the upper-triangle judgments by how far they stray from the
    /// ratios implied by `priorities`, largest deviation first.
    pub fn inconsistent_judgments(
        matrix: &ComparisonMatrix,
        priorities: &PriorityVector,
        limit: usize,
    ) -> Result<Vec<JudgmentRevision>, AnalysisError> {
        Self::check_alignment(matrix, priorities)?;
        let w = priorities.weights();
        let labels = matrix.elements();
        let n = matrix.size();

        let mut revisions = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let current = matrix.get(i, j);
                let suggested = w[i] / w[j];
                revisions.push(JudgmentRevision {
                    row_element: labels[i].clone(),
                    column_element: labels[j].clone(),
                    current,
                    suggested,
                    deviation: (current / suggested).ln().abs(),
                });
            }
        }

        revisions.sort_by(|a, b| {
            b.deviation
                .partial_cmp(&a.deviation)
                .unwrap_or(Ordering::Equal)
        });
        revisions.truncate(limit);
        Ok(revisions)
    }

    fn check_alignment(
        matrix: &ComparisonMatrix,
        priorities: &PriorityVector,
    ) -> Result<(), AnalysisError> {
        if priorities.len() != matrix.size() || priorities.elements() != matrix.elements() {
            return Err(AnalysisError::invalid_priorities(
                "priority vector does not match matrix elements",
            ));
        }
        if priorities.weights().iter().any(|w| *w <= 0.0) {
            return Err(AnalysisError::invalid_priorities(
                "consistency requires strictly positive weights",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ahp::{MatrixInput, MatrixValidator};

    fn matrix(input: MatrixInput) -> ComparisonMatrix {
        MatrixValidator::default().validate(&input).unwrap().matrix
    }

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{}", i)).collect()
    }

    #[test]
    fn random_index_table_matches_saaty() {
        assert_eq!(random_index(1), 0.0);
        assert_eq!(random_index(2), 0.0);
        assert_eq!(random_index(3), 0.58);
        assert_eq!(random_index(9), 1.45);
        assert_eq!(random_index(12), 1.48);
        assert_eq!(random_index(15), 1.59);
        assert_eq!(random_index(40), 1.59);
    }

    #[test]
    fn consistent_matrix_has_zero_ratio() {
        let m = matrix(MatrixInput::from_priorities(labels(5), &[0.4, 0.25, 0.15, 0.12, 0.08]).unwrap());
        let (_, report) = ConsistencyEvaluator::default().assess(&m);

        assert!(report.consistency_ratio.abs() < 1e-9);
        assert!((report.lambda_max - 5.0).abs() < 1e-9);
        assert!(report.is_acceptable);
        assert_eq!(report.matrix_size, 5);
    }

    #[test]
    fn two_by_two_is_always_consistent() {
        let m = matrix(MatrixInput::from_upper_triangle(labels(2), &[9.0]).unwrap());
        let (_, report) = ConsistencyEvaluator::default().assess(&m);
        assert_eq!(report.consistency_index, 0.0);
        assert_eq!(report.consistency_ratio, 0.0);
        assert_eq!(report.random_index, 0.0);
    }

    #[test]
    fn single_element_reports_zero() {
        let m = matrix(MatrixInput::new(vec!["x"], vec![vec![1.0]]));
        let (_, report) = ConsistencyEvaluator::default().assess(&m);
        assert_eq!(report.consistency_ratio, 0.0);
        assert_eq!(report.lambda_max, 1.0);
    }

    #[test]
    fn textbook_matrix_is_acceptable() {
        let m = matrix(MatrixInput::from_upper_triangle(labels(3), &[3.0, 5.0, 2.0]).unwrap());
        let (_, report) = ConsistencyEvaluator::default().assess(&m);
        // λmax ≈ 3.0037, CI ≈ 0.0018, CR ≈ 0.0032
        assert!((report.lambda_max - 3.0037).abs() < 1e-3);
        assert!(report.consistency_ratio < 0.01);
        assert!(report.is_acceptable);
    }

    #[test]
    fn intransitive_matrix_is_rejected() {
        // a > b, b > c, but c > a
        let m = matrix(MatrixInput::from_upper_triangle(labels(3), &[5.0, 1.0 / 5.0, 5.0]).unwrap());
        let (_, report) = ConsistencyEvaluator::default().assess(&m);
        assert!(report.consistency_ratio > 0.10);
        assert!(!report.is_acceptable);
    }

    #[test]
    fn threshold_is_injectable() {
        let m = matrix(MatrixInput::from_upper_triangle(labels(3), &[3.0, 5.0, 2.0]).unwrap());
        let strict = ConsistencyEvaluator::new(ConsistencyConfig {
            acceptable_ratio: 0.001,
        });
        let (_, report) = strict.assess(&m);
        assert!(!report.is_acceptable);
    }

    #[test]
    fn evaluate_rejects_misaligned_vector() {
        let m = matrix(MatrixInput::from_upper_triangle(labels(2), &[2.0]).unwrap());
        let other = PriorityVector::try_new(vec!["x".into(), "y".into()], vec![0.5, 0.5]).unwrap();
        let result = ConsistencyEvaluator::default().evaluate(&m, &other);
        assert!(matches!(result, Err(AnalysisError::InvalidPriorityVector { .. })));
    }

    #[test]
    fn evaluate_rejects_zero_weight() {
        let m = matrix(MatrixInput::from_upper_triangle(labels(2), &[2.0]).unwrap());
        let zero = PriorityVector::try_new(labels(2), vec![1.0, 0.0]).unwrap();
        assert!(ConsistencyEvaluator::default().evaluate(&m, &zero).is_err());
    }

    #[test]
    fn inconsistent_judgments_point_at_the_outlier() {
        // Consistent with weights 8:4:2:1 except a03, which should be 8
        let m = matrix(
            MatrixInput::from_upper_triangle(labels(4), &[2.0, 4.0, 1.0 / 8.0, 2.0, 4.0, 2.0])
                .unwrap(),
        );
        let priorities = PriorityDeriver::derive(&m);
        let revisions = ConsistencyEvaluator::inconsistent_judgments(&m, &priorities, 1).unwrap();

        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].row_element, "c0");
        assert_eq!(revisions[0].column_element, "c3");
        assert!(revisions[0].suggested > revisions[0].current);
    }

    #[test]
    fn consistent_matrix_has_no_deviation() {
        let m = matrix(MatrixInput::from_priorities(labels(3), &[0.6, 0.3, 0.1]).unwrap());
        let priorities = PriorityDeriver::derive(&m);
        let revisions = ConsistencyEvaluator::inconsistent_judgments(&m, &priorities, 10).unwrap();
        assert_eq!(revisions.len(), 3);
        assert!(revisions.iter().all(|r| r.deviation < 1e-9));
    }

    #[test]
    fn report_serializes_camel_case() {
        let m = matrix(MatrixInput::from_upper_triangle(labels(2), &[2.0]).unwrap());
        let (_, report) = ConsistencyEvaluator::default().assess(&m);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"consistencyRatio\":0.0"));
        assert!(json.contains("\"isAcceptable\":true"));
    }
}
