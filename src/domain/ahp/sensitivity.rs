//! Sensitivity Analyzer - Re-ranks alternatives as one criterion's weight moves.
//!
//! When a criterion's local weight changes from `w_old` to `w'`, each sibling
//! is rescaled by `(1 - w') / (1 - w_old)` so the group still sums to 1. The
//! siblings keep their relative proportions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::vec::IntoIter;

use super::hierarchy::ScoreTable;
use super::{AlternativeScores, CriteriaHierarchy, Ranking};
use crate::config::SensitivityConfig;
use crate::domain::foundation::{AnalysisError, HierarchyDefect};

/// The weights to try for the adjusted criterion.
///
/// On the wire a bare array is a discrete list and an object with `min`,
/// `max` and `steps` is a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightAdjustments {
    /// An explicit list of local weights, each in [0, 1].
    Discrete(Vec<f64>),
    /// `steps` evenly spaced weights from `min` to `max`, both included.
    Sweep { min: f64, max: f64, steps: usize },
}

impl WeightAdjustments {
    /// Full sweep over [0, 1].
    pub fn full_range(steps: usize) -> Self {
        Self::Sweep {
            min: 0.0,
            max: 1.0,
            steps,
        }
    }

    fn resolve(&self, max_steps: usize) -> Result<Vec<f64>, AnalysisError> {
        let weights = match self {
            Self::Discrete(weights) => {
                if weights.is_empty() {
                    return Err(AnalysisError::invalid_sensitivity(
                        "no weights to evaluate",
                    ));
                }
                if weights.len() > max_steps {
                    return Err(AnalysisError::SizeLimitExceeded {
                        what: "sensitivity steps",
                        limit: max_steps,
                        actual: weights.len(),
                    });
                }
                weights.clone()
            }
            Self::Sweep { min, max, steps } => {
                let (min, max, steps) = (*min, *max, *steps);
                if steps == 0 {
                    return Err(AnalysisError::invalid_sensitivity(
                        "sweep needs at least one step",
                    ));
                }
                if steps > max_steps {
                    return Err(AnalysisError::SizeLimitExceeded {
                        what: "sensitivity steps",
                        limit: max_steps,
                        actual: steps,
                    });
                }
                if !(min <= max) {
                    return Err(AnalysisError::invalid_sensitivity(format!(
                        "sweep range [{}, {}] is empty",
                        min, max
                    )));
                }
                if steps == 1 {
                    vec![min]
                } else {
                    let step = (max - min) / (steps - 1) as f64;
                    (0..steps)
                        .map(|i| if i == steps - 1 { max } else { min + step * i as f64 })
                        .collect()
                }
            }
        };

        if let Some(bad) = weights
            .iter()
            .find(|w| !(w.is_finite() && (0.0..=1.0).contains(*w)))
        {
            return Err(AnalysisError::invalid_sensitivity(format!(
                "weight {} is outside [0, 1]",
                bad
            )));
        }
        Ok(weights)
    }
}

/// Which criterion to move and where to move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityRequest {
    pub target_criterion_id: String,
    pub weight_adjustments: WeightAdjustments,
}

impl SensitivityRequest {
    /// Creates a request.
    pub fn new(target_criterion_id: impl Into<String>, weight_adjustments: WeightAdjustments) -> Self {
        Self {
            target_criterion_id: target_criterion_id.into(),
            weight_adjustments,
        }
    }
}

/// The ranking obtained at one adjusted weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub weight: f64,
    /// Rescaled local weights of the criterion's siblings.
    pub sibling_weights: BTreeMap<String, f64>,
    pub ranking: Ranking,
}

/// A change of leader between two consecutive points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankReversal {
    pub from_weight: f64,
    pub to_weight: f64,
    pub previous_leader: String,
    pub new_leader: String,
}

/// Lazily evaluates one ranking per requested weight.
#[derive(Debug, Clone)]
pub struct SensitivitySweep {
    hierarchy: CriteriaHierarchy,
    table: ScoreTable,
    target: usize,
    siblings: Vec<usize>,
    base: Vec<f64>,
    weights: IntoIter<f64>,
}

impl SensitivitySweep {
    fn point(&self, weight: f64) -> SensitivityPoint {
        let previous = self.base[self.target];
        let scale = (1.0 - weight) / (1.0 - previous);

        let mut local = self.base.clone();
        local[self.target] = weight;
        for &s in &self.siblings {
            local[s] = self.base[s] * scale;
        }

        let global = self.hierarchy.global_weights_for(&local);
        let nodes = self.hierarchy.nodes();
        SensitivityPoint {
            weight,
            sibling_weights: self
                .siblings
                .iter()
                .map(|&s| (nodes[s].id.clone(), local[s]))
                .collect(),
            ranking: self.table.rank(&global),
        }
    }
}

impl Iterator for SensitivitySweep {
    type Item = SensitivityPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let weight = self.weights.next()?;
        Some(self.point(weight))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.weights.size_hint()
    }
}

impl ExactSizeIterator for SensitivitySweep {}

/// Reruns the hierarchy aggregation under adjusted criterion weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivityAnalyzer {
    config: SensitivityConfig,
}

impl SensitivityAnalyzer {
    /// Creates an analyzer with the given limits.
    pub fn new(config: SensitivityConfig) -> Self {
        Self { config }
    }

    /// Prepares a lazy sweep. Inputs are validated up front; each point is
    /// computed when the iterator is advanced.
    ///
    /// # Errors
    /// - `InvalidHierarchy` if the criterion is unknown
    /// - `DegenerateSensitivityInput` if the criterion already carries all of
    ///   its group's weight, so siblings cannot be rescaled
    /// - `InvalidSensitivityInput` for weights outside [0, 1] or an empty request
    /// - `SizeLimitExceeded` if more than `max_steps` weights are requested
    pub fn sweep(
        &self,
        hierarchy: &CriteriaHierarchy,
        scores: &AlternativeScores,
        request: &SensitivityRequest,
    ) -> Result<SensitivitySweep, AnalysisError> {
        let target = hierarchy.index_of(&request.target_criterion_id).ok_or_else(|| {
            AnalysisError::invalid_hierarchy(HierarchyDefect::UnknownCriterion(
                request.target_criterion_id.clone(),
            ))
        })?;

        let base = hierarchy.local_weights();
        if 1.0 - base[target] <= f64::EPSILON {
            return Err(AnalysisError::DegenerateSensitivityInput {
                criterion_id: request.target_criterion_id.clone(),
            });
        }

        let weights = request.weight_adjustments.resolve(self.config.max_steps)?;
        let table = ScoreTable::resolve(hierarchy, scores)?;
        let siblings = hierarchy
            .sibling_group(target)
            .iter()
            .copied()
            .filter(|&s| s != target)
            .collect();

        Ok(SensitivitySweep {
            hierarchy: hierarchy.clone(),
            table,
            target,
            siblings,
            base,
            weights: weights.into_iter(),
        })
    }

    /// Evaluates every requested weight.
    pub fn analyze(
        &self,
        hierarchy: &CriteriaHierarchy,
        scores: &AlternativeScores,
        request: &SensitivityRequest,
    ) -> Result<Vec<SensitivityPoint>, AnalysisError> {
        Ok(self.sweep(hierarchy, scores, request)?.collect())
    }

    /// Finds consecutive points whose leading alternative differs.
    pub fn rank_reversals(points: &[SensitivityPoint]) -> Vec<RankReversal> {
        points
            .windows(2)
            .filter_map(|pair| {
                let before = pair[0].ranking.leader()?;
                let after = pair[1].ranking.leader()?;
                (before.alternative_id != after.alternative_id).then(|| RankReversal {
                    from_weight: pair[0].weight,
                    to_weight: pair[1].weight,
                    previous_leader: before.alternative_id.clone(),
                    new_leader: after.alternative_id.clone(),
                })
            })
            .collect()
    }
}
