//! Scenario Runner - Re-optimizes under budget deltas and classifies item stability.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::item::{BudgetRequest, OptimizationResult};
use super::BudgetOptimizer;
use crate::domain::foundation::AnalysisError;

/// A base optimization plus the percentage deltas to try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRequest {
    #[serde(flatten)]
    pub base: BudgetRequest,
    /// Budget changes in percent, e.g. `[-20, -10, 10, 20]`.
    pub scenarios: Vec<f64>,
}

/// What happened in one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ScenarioOutcome {
    #[serde(rename_all = "camelCase")]
    Optimized {
        result: OptimizationResult,
        /// Funded here but not in the baseline.
        added_item_ids: Vec<String>,
        /// Funded in the baseline but not here.
        dropped_item_ids: Vec<String>,
    },
    /// Forced spending exceeds the scenario budget.
    #[serde(rename_all = "camelCase")]
    Infeasible { required: f64, available: f64 },
}

/// One scenario's budget and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub delta_percent: f64,
    pub budget: f64,
    pub outcome: ScenarioOutcome,
}

impl ScenarioResult {
    /// Returns the optimization result if the scenario was feasible.
    pub fn result(&self) -> Option<&OptimizationResult> {
        match &self.outcome {
            ScenarioOutcome::Optimized { result, .. } => Some(result),
            ScenarioOutcome::Infeasible { .. } => None,
        }
    }
}

/// How an item's funding reacts to budget changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StabilityClass {
    /// Funded in the baseline and every feasible scenario.
    AlwaysSelected,
    /// Funded in some feasible runs only.
    ThresholdSensitive,
    /// Never funded.
    NeverSelected,
}

/// Stability of one item across the baseline and feasible scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStability {
    pub item_id: String,
    pub class: StabilityClass,
    /// Number of feasible runs (baseline included) that funded the item.
    pub funded_in: usize,
    /// Smallest budget at which the item was funded.
    pub lowest_funded_budget: Option<f64>,
}

/// Baseline, per-scenario outcomes and the stability summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub baseline: OptimizationResult,
    pub scenarios: Vec<ScenarioResult>,
    pub stability: Vec<ItemStability>,
}

impl ScenarioReport {
    /// Returns the stability entry of an item.
    pub fn stability_of(&self, item_id: &str) -> Option<&ItemStability> {
        self.stability.iter().find(|s| s.item_id == item_id)
    }
}

/// Runs the optimizer once per budget delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioRunner {
    optimizer: BudgetOptimizer,
}

impl ScenarioRunner {
    /// Creates a runner around a configured optimizer.
    pub fn new(optimizer: BudgetOptimizer) -> Self {
        Self { optimizer }
    }

    /// Optimizes the baseline and every scenario.
    ///
    /// Scenario budget is `base × (1 + delta / 100)`. A scenario whose forced
    /// spending no longer fits is reported as `Infeasible`; the run continues.
    ///
    /// # Errors
    /// - `InvalidBudgetInput` for an empty scenario list or a delta below -100 %
    /// - any error of the baseline optimization
    pub fn run(&self, request: &ScenarioRequest) -> Result<ScenarioReport, AnalysisError> {
        if request.scenarios.is_empty() {
            return Err(AnalysisError::invalid_budget("no scenarios to run"));
        }
        if let Some(bad) = request
            .scenarios
            .iter()
            .find(|d| !(d.is_finite() && **d >= -100.0))
        {
            return Err(AnalysisError::invalid_budget(format!(
                "scenario delta {}% must be finite and at least -100%",
                bad
            )));
        }

        let base_budget = request.base.constraint.total_budget;
        let baseline = self.optimizer.optimize(&request.base)?;
        let baseline_funded = baseline.funded_item_ids();

        let mut scenarios = Vec::with_capacity(request.scenarios.len());
        for &delta in &request.scenarios {
            let budget = (base_budget * (1.0 + delta / 100.0)).max(0.0);
            let scenario = BudgetRequest {
                constraint: request.base.constraint.with_total_budget(budget),
                ..request.base.clone()
            };

            let outcome = match self.optimizer.optimize(&scenario) {
                Ok(result) => {
                    let funded = result.funded_item_ids();
                    let added_item_ids = funded
                        .iter()
                        .filter(|id| !baseline_funded.contains(*id))
                        .map(|id| id.to_string())
                        .collect();
                    let dropped_item_ids = baseline_funded
                        .iter()
                        .filter(|id| !funded.contains(*id))
                        .map(|id| id.to_string())
                        .collect();
                    ScenarioOutcome::Optimized {
                        result,
                        added_item_ids,
                        dropped_item_ids,
                    }
                }
                Err(AnalysisError::BudgetInfeasible {
                    required,
                    available,
                }) => {
                    debug!(delta, required, available, "Scenario infeasible");
                    ScenarioOutcome::Infeasible {
                        required,
                        available,
                    }
                }
                Err(other) => return Err(other),
            };

            scenarios.push(ScenarioResult {
                delta_percent: delta,
                budget,
                outcome,
            });
        }

        let stability = Self::stability(request, base_budget, &baseline, &scenarios);
        Ok(ScenarioReport {
            baseline,
            scenarios,
            stability,
        })
    }

    fn stability(
        request: &ScenarioRequest,
        base_budget: f64,
        baseline: &OptimizationResult,
        scenarios: &[ScenarioResult],
    ) -> Vec<ItemStability> {
        let runs: Vec<(f64, &OptimizationResult)> = std::iter::once((base_budget, baseline))
            .chain(
                scenarios
                    .iter()
                    .filter_map(|s| s.result().map(|r| (s.budget, r))),
            )
            .collect();

        request
            .base
            .items
            .iter()
            .map(|item| {
                let funded: Vec<f64> = runs
                    .iter()
                    .filter(|(_, result)| result.is_funded(&item.id))
                    .map(|(budget, _)| *budget)
                    .collect();
                let class = match funded.len() {
                    0 => StabilityClass::NeverSelected,
                    n if n == runs.len() => StabilityClass::AlwaysSelected,
                    _ => StabilityClass::ThresholdSensitive,
                };
                ItemStability {
                    item_id: item.id.clone(),
                    class,
                    funded_in: funded.len(),
                    lowest_funded_budget: funded.into_iter().reduce(f64::min),
                }
            })
            .collect()
    }
}
