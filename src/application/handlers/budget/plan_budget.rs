//! PlanBudgetHandler - Optimization, scenarios and shortlist in one call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::BudgetConfig;
use crate::domain::ahp::Ranking;
use crate::domain::budget::{
    BudgetItem, BudgetOptimizer, BudgetRequest, EfficiencyRank, EfficiencyRecommender,
    OptimizationResult, ScenarioReport, ScenarioRequest, ScenarioRunner,
};
use crate::domain::foundation::AnalysisError;

/// Command to plan a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanBudgetCommand {
    #[serde(flatten)]
    pub request: BudgetRequest,
    /// Percentage deltas; no scenario analysis when empty.
    #[serde(default)]
    pub scenarios: Vec<f64>,
    /// Size of the efficiency shortlist; none when absent.
    #[serde(default)]
    pub shortlist_size: Option<usize>,
}

/// Result of budget planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPlan {
    pub optimization: OptimizationResult,
    pub scenarios: Option<ScenarioReport>,
    pub shortlist: Vec<EfficiencyRank>,
}

/// Handler for budget planning.
pub struct PlanBudgetHandler {
    optimizer: BudgetOptimizer,
}

impl PlanBudgetHandler {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            optimizer: BudgetOptimizer::new(config),
        }
    }

    pub fn handle(&self, cmd: PlanBudgetCommand) -> Result<BudgetPlan, AnalysisError> {
        // 1. Optimize, through the scenario runner when deltas are given
        let (optimization, scenarios) = if cmd.scenarios.is_empty() {
            (self.optimizer.optimize(&cmd.request)?, None)
        } else {
            let report = ScenarioRunner::new(self.optimizer).run(&ScenarioRequest {
                base: cmd.request.clone(),
                scenarios: cmd.scenarios.clone(),
            })?;
            (report.baseline.clone(), Some(report))
        };

        // 2. Shortlist
        let shortlist = match cmd.shortlist_size {
            Some(k) => EfficiencyRecommender::top_k(&cmd.request.items, k)?,
            None => Vec::new(),
        };

        info!(
            mode = ?cmd.request.mode,
            funded = optimization.funded_item_ids().len(),
            total_utility = optimization.total_utility,
            scenarios = cmd.scenarios.len(),
            "Budget planned"
        );

        Ok(BudgetPlan {
            optimization,
            scenarios,
            shortlist,
        })
    }

    /// Turns a decision ranking into budget items whose utility is the
    /// composite score.
    ///
    /// # Errors
    /// `InvalidBudgetInput` if a ranked alternative has no cost.
    pub fn items_from_ranking(
        ranking: &Ranking,
        costs: &BTreeMap<String, f64>,
    ) -> Result<Vec<BudgetItem>, AnalysisError> {
        ranking
            .entries()
            .iter()
            .map(|entry| {
                let cost = costs.get(&entry.alternative_id).copied().ok_or_else(|| {
                    AnalysisError::invalid_budget(format!(
                        "no cost for alternative '{}'",
                        entry.alternative_id
                    ))
                })?;
                Ok(BudgetItem::new(entry.alternative_id.clone(), cost, entry.score))
            })
            .collect()
    }
}
