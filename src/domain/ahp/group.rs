//! Group Aggregator - Combines several evaluators' priority vectors.
//!
//! Uses the weighted geometric mean (aggregation of individual priorities),
//! which preserves the reciprocal structure of the underlying judgments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::PriorityVector;
use crate::domain::foundation::{
    all_non_negative, approx_eq, normalize, AnalysisError, EvaluatorWeight, ValidationError,
    WEIGHT_SUM_TOLERANCE,
};

/// Priority vectors keyed by evaluator, plus optional influence weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInput {
    /// Evaluators without an entry get weight 1.
    #[serde(default)]
    pub evaluator_weights: BTreeMap<String, f64>,
    /// Every vector must have the same length and sum to 1.
    pub vectors: BTreeMap<String, Vec<f64>>,
}

impl GroupInput {
    /// Adds an evaluator's vector with the default weight.
    pub fn with_vector(mut self, evaluator_id: impl Into<String>, vector: Vec<f64>) -> Self {
        self.vectors.insert(evaluator_id.into(), vector);
        self
    }

    /// Adds an evaluator's vector with an explicit weight.
    pub fn with_weighted_vector(
        mut self,
        evaluator_id: impl Into<String>,
        weight: f64,
        vector: Vec<f64>,
    ) -> Self {
        let evaluator_id = evaluator_id.into();
        self.evaluator_weights.insert(evaluator_id.clone(), weight);
        self.vectors.insert(evaluator_id, vector);
        self
    }
}

/// The consensus vector and how far each evaluator sits from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPriorities {
    pub weights: Vec<f64>,
    pub participants: usize,
    /// Sum of the evaluator weights that took part.
    pub total_influence: f64,
    /// Largest absolute difference between each evaluator's vector and the consensus.
    pub divergence: BTreeMap<String, f64>,
}

impl GroupPriorities {
    /// Returns the evaluator furthest from the consensus.
    pub fn most_divergent(&self) -> Option<(&str, f64)> {
        self.divergence
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(id, d)| (id.as_str(), *d))
    }
}

/// Aggregates individual priority vectors into a group consensus.
pub struct GroupAggregator;

impl GroupAggregator {
    /// Computes the normalized weighted geometric mean of the vectors.
    ///
    /// # Algorithm
    /// `agg[i] = Π_e v_e[i]^(w_e / W)`, then `agg / Σ agg`
    ///
    /// A zero entry in any vector forces that aggregated entry to zero.
    ///
    /// # Edge Cases
    /// - A single evaluator's vector is returned unchanged
    ///
    /// # Errors
    /// - `InvalidEvaluatorWeight` for a weight that is not positive and finite
    /// - `InvalidPriorityVector` for mismatched lengths, vectors that do not
    ///   sum to 1, or a consensus with no positive entry
    pub fn aggregate(input: &GroupInput) -> Result<GroupPriorities, AnalysisError> {
        if input.vectors.is_empty() {
            return Err(ValidationError::empty_field("vectors").into());
        }

        let weights = Self::resolve_weights(input)?;
        let n = Self::check_vectors(&input.vectors)?;
        let total_influence: f64 = weights.values().map(|w| w.value()).sum();

        let consensus = if input.vectors.len() == 1 {
            input.vectors.values().next().cloned().unwrap_or_default()
        } else {
            let raw: Vec<f64> = (0..n)
                .map(|i| {
                    let mut log_sum = 0.0;
                    for (evaluator, vector) in &input.vectors {
                        let value = vector[i];
                        if value == 0.0 {
                            return 0.0;
                        }
                        log_sum += weights[evaluator.as_str()].value() * value.ln();
                    }
                    (log_sum / total_influence).exp()
                })
                .collect();

            normalize(&raw).ok_or_else(|| {
                AnalysisError::invalid_priorities("evaluators share no positive weight")
            })?
        };

        let divergence: BTreeMap<String, f64> = input
            .vectors
            .iter()
            .map(|(evaluator, vector)| {
                let deviation = vector
                    .iter()
                    .zip(&consensus)
                    .map(|(v, c)| (v - c).abs())
                    .fold(0.0, f64::max);
                (evaluator.clone(), deviation)
            })
            .collect();

        debug!(
            participants = input.vectors.len(),
            total_influence, "Aggregated group priorities"
        );

        Ok(GroupPriorities {
            weights: consensus,
            participants: input.vectors.len(),
            total_influence,
            divergence,
        })
    }

    /// Aggregates labelled vectors that all describe the same elements.
    pub fn aggregate_labelled(
        evaluator_weights: &BTreeMap<String, f64>,
        vectors: &BTreeMap<String, PriorityVector>,
    ) -> Result<(PriorityVector, GroupPriorities), AnalysisError> {
        let elements = match vectors.values().next() {
            Some(first) => first.elements().to_vec(),
            None => return Err(ValidationError::empty_field("vectors").into()),
        };
        // Align every vector to the first one's element order
        let mut aligned = BTreeMap::new();
        for (evaluator, vector) in vectors {
            let weights: Option<Vec<f64>> = if vector.len() == elements.len() {
                elements.iter().map(|e| vector.weight_of(e)).collect()
            } else {
                None
            };
            let weights = weights.ok_or_else(|| {
                AnalysisError::invalid_priorities(format!(
                    "evaluator '{}' ranked different elements",
                    evaluator
                ))
            })?;
            aligned.insert(evaluator.clone(), weights);
        }

        let input = GroupInput {
            evaluator_weights: evaluator_weights.clone(),
            vectors: aligned,
        };
        let group = Self::aggregate(&input)?;
        let consensus = PriorityVector::try_new(elements, group.weights.clone())?;
        Ok((consensus, group))
    }

    fn resolve_weights(
        input: &GroupInput,
    ) -> Result<BTreeMap<&str, EvaluatorWeight>, AnalysisError> {
        input
            .vectors
            .keys()
            .map(|evaluator| {
                let weight = match input.evaluator_weights.get(evaluator) {
                    None => EvaluatorWeight::DEFAULT,
                    Some(&raw) => EvaluatorWeight::try_new(raw).map_err(|_| {
                        AnalysisError::InvalidEvaluatorWeight {
                            evaluator_id: evaluator.clone(),
                            weight: raw,
                        }
                    })?,
                };
                Ok((evaluator.as_str(), weight))
            })
            .collect()
    }

    fn check_vectors(vectors: &BTreeMap<String, Vec<f64>>) -> Result<usize, AnalysisError> {
        let n = vectors.values().next().map(Vec::len).unwrap_or(0);
        if n == 0 {
            return Err(AnalysisError::invalid_priorities("vector is empty"));
        }
        for (evaluator, vector) in vectors {
            if vector.len() != n {
                return Err(AnalysisError::invalid_priorities(format!(
                    "evaluator '{}' supplied {} weights, expected {}",
                    evaluator,
                    vector.len(),
                    n
                )));
            }
            if !all_non_negative(vector) {
                return Err(AnalysisError::invalid_priorities(format!(
                    "evaluator '{}' supplied a negative or non-finite weight",
                    evaluator
                )));
            }
            let total: f64 = vector.iter().sum();
            if !approx_eq(total, 1.0, WEIGHT_SUM_TOLERANCE) {
                return Err(AnalysisError::invalid_priorities(format!(
                    "weights of evaluator '{}' sum to {}",
                    evaluator, total
                )));
            }
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn single_evaluator_is_returned_unchanged() {
        let input = GroupInput::default().with_weighted_vector("alice", 4.0, vec![0.7, 0.2, 0.1]);
        let group = GroupAggregator::aggregate(&input).unwrap();
        assert_eq!(group.weights, vec![0.7, 0.2, 0.1]);
        assert_eq!(group.participants, 1);
        assert_eq!(group.total_influence, 4.0);
        assert_eq!(group.divergence["alice"], 0.0);
    }

    #[test]
    fn equal_weights_take_geometric_mean() {
        let input = GroupInput::default()
            .with_vector("alice", vec![0.5, 0.5])
            .with_vector("bob", vec![0.8, 0.2]);
        let group = GroupAggregator::aggregate(&input).unwrap();

        // sqrt(0.4) : sqrt(0.1) = 2 : 1
        assert_close(group.weights[0], 2.0 / 3.0);
        assert_close(group.weights[1], 1.0 / 3.0);
        assert_eq!(group.total_influence, 2.0);
    }

    #[test]
    fn heavier_evaluator_pulls_consensus() {
        let input = GroupInput::default()
            .with_weighted_vector("lead", 3.0, vec![0.8, 0.2])
            .with_weighted_vector("intern", 1.0, vec![0.5, 0.5]);
        let group = GroupAggregator::aggregate(&input).unwrap();

        let ratio = 4f64.powf(0.75);
        assert_close(group.weights[0], ratio / (1.0 + ratio));
        assert_eq!(group.most_divergent().unwrap().0, "intern");
    }

    #[test]
    fn result_is_normalized() {
        let input = GroupInput::default()
            .with_vector("a", vec![0.6, 0.3, 0.1])
            .with_vector("b", vec![0.2, 0.5, 0.3])
            .with_weighted_vector("c", 2.5, vec![0.4, 0.4, 0.2]);
        let group = GroupAggregator::aggregate(&input).unwrap();
        assert_close(group.weights.iter().sum(), 1.0);
    }

    #[test]
    fn zero_entry_zeroes_the_consensus_entry() {
        let input = GroupInput::default()
            .with_vector("a", vec![0.0, 0.5, 0.5])
            .with_vector("b", vec![0.2, 0.4, 0.4]);
        let group = GroupAggregator::aggregate(&input).unwrap();
        assert_eq!(group.weights[0], 0.0);
        assert_close(group.weights[1], 0.5);
    }

    #[test]
    fn disjoint_support_is_rejected() {
        let input = GroupInput::default()
            .with_vector("a", vec![1.0, 0.0])
            .with_vector("b", vec![0.0, 1.0]);
        assert!(matches!(
            GroupAggregator::aggregate(&input),
            Err(AnalysisError::InvalidPriorityVector { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_evaluator_weight() {
        let input = GroupInput::default()
            .with_weighted_vector("a", 0.0, vec![0.5, 0.5])
            .with_vector("b", vec![0.5, 0.5]);
        assert_eq!(
            GroupAggregator::aggregate(&input).unwrap_err(),
            AnalysisError::InvalidEvaluatorWeight {
                evaluator_id: "a".into(),
                weight: 0.0
            }
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let input = GroupInput::default()
            .with_vector("a", vec![0.5, 0.5])
            .with_vector("b", vec![0.2, 0.3, 0.5]);
        assert!(GroupAggregator::aggregate(&input).is_err());
    }

    #[test]
    fn rejects_unnormalized_vector() {
        let input = GroupInput::default().with_vector("a", vec![0.5, 0.6]);
        assert!(matches!(
            GroupAggregator::aggregate(&input),
            Err(AnalysisError::InvalidPriorityVector { .. })
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            GroupAggregator::aggregate(&GroupInput::default()),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn labelled_vectors_must_share_elements() {
        let mut vectors = BTreeMap::new();
        vectors.insert(
            "a".to_string(),
            PriorityVector::try_new(vec!["x".into(), "y".into()], vec![0.5, 0.5]).unwrap(),
        );
        vectors.insert(
            "b".to_string(),
            PriorityVector::try_new(vec!["x".into(), "z".into()], vec![0.5, 0.5]).unwrap(),
        );
        assert!(GroupAggregator::aggregate_labelled(&BTreeMap::new(), &vectors).is_err());
    }

    #[test]
    fn labelled_vectors_keep_their_labels() {
        let mut vectors = BTreeMap::new();
        vectors.insert(
            "a".to_string(),
            PriorityVector::try_new(vec!["x".into(), "y".into()], vec![0.5, 0.5]).unwrap(),
        );
        vectors.insert(
            "b".to_string(),
            PriorityVector::try_new(vec!["x".into(), "y".into()], vec![0.8, 0.2]).unwrap(),
        );
        let (consensus, _) = GroupAggregator::aggregate_labelled(&BTreeMap::new(), &vectors).unwrap();
        assert_close(consensus.weight_of("x").unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn labelled_vectors_are_aligned_by_element() {
        let mut vectors = BTreeMap::new();
        vectors.insert(
            "a".to_string(),
            PriorityVector::try_new(vec!["x".into(), "y".into()], vec![0.5, 0.5]).unwrap(),
        );
        vectors.insert(
            "b".to_string(),
            PriorityVector::try_new(vec!["y".into(), "x".into()], vec![0.2, 0.8]).unwrap(),
        );
        let (consensus, _) = GroupAggregator::aggregate_labelled(&BTreeMap::new(), &vectors).unwrap();
        assert_eq!(consensus.elements(), &["x".to_string(), "y".to_string()]);
        assert_close(consensus.weight_of("x").unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn input_deserializes_from_contract_shape() {
        let json = r#"{
            "evaluatorWeights": { "alice": 2.0 },
            "vectors": { "alice": [0.6, 0.4], "bob": [0.5, 0.5] }
        }"#;
        let input: GroupInput = serde_json::from_str(json).unwrap();
        let group = GroupAggregator::aggregate(&input).unwrap();
        assert_eq!(group.participants, 2);
        assert_eq!(group.total_influence, 3.0);
    }
}
