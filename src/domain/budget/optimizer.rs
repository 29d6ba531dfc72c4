//! Budget Optimizer - Entry point shared by the binary and continuous modes.

use std::collections::HashSet;
use tracing::debug;

use super::item::{BudgetConstraint, BudgetItem, BudgetRequest, OptimizationMode, OptimizationResult};
use super::{allocation, knapsack};
use crate::config::BudgetConfig;
use crate::domain::foundation::AnalysisError;

/// Slack allowed when comparing sums of costs against a budget.
pub(crate) const COST_TOLERANCE: f64 = 1e-9;

/// Chooses or sizes item funding to maximize total utility within a budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetOptimizer {
    config: BudgetConfig,
}

impl BudgetOptimizer {
    /// Creates an optimizer with the given size limits.
    pub fn new(config: BudgetConfig) -> Self {
        Self { config }
    }

    /// Solves the request in its selected mode.
    ///
    /// # Errors
    /// - `InvalidBudgetInput` for negative or non-finite amounts, duplicate
    ///   item ids, unknown or contradictory mandatory/excluded ids, or
    ///   inverted per-item bounds
    /// - `SizeLimitExceeded` if the item list exceeds `max_items`
    /// - `BudgetInfeasible` if forced spending alone exceeds the budget
    pub fn optimize(&self, request: &BudgetRequest) -> Result<OptimizationResult, AnalysisError> {
        self.validate(&request.items, &request.constraint)?;

        let result = match request.mode {
            OptimizationMode::Binary => {
                knapsack::solve(&request.items, &request.constraint, self.config.max_dp_cells)?
            }
            OptimizationMode::Continuous => {
                allocation::solve(&request.items, &request.constraint)?
            }
        };

        debug!(
            mode = ?request.mode,
            items = request.items.len(),
            total_cost = result.total_cost,
            total_utility = result.total_utility,
            "Budget optimized"
        );
        Ok(result)
    }

    fn validate(
        &self,
        items: &[BudgetItem],
        constraint: &BudgetConstraint,
    ) -> Result<(), AnalysisError> {
        if items.len() > self.config.max_items {
            return Err(AnalysisError::SizeLimitExceeded {
                what: "budget items",
                limit: self.config.max_items,
                actual: items.len(),
            });
        }
        if !(constraint.total_budget.is_finite() && constraint.total_budget >= 0.0) {
            return Err(AnalysisError::invalid_budget(format!(
                "total budget {} must be finite and non-negative",
                constraint.total_budget
            )));
        }

        let mut ids = HashSet::with_capacity(items.len());
        for item in items {
            item.check()?;
            if !ids.insert(item.id.as_str()) {
                return Err(AnalysisError::invalid_budget(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
        }

        for id in constraint
            .mandatory_item_ids
            .iter()
            .chain(&constraint.excluded_item_ids)
        {
            if !ids.contains(id.as_str()) {
                return Err(AnalysisError::invalid_budget(format!(
                    "constraint refers to unknown item '{}'",
                    id
                )));
            }
        }
        if let Some(id) = constraint
            .mandatory_item_ids
            .iter()
            .find(|id| constraint.is_excluded(id))
        {
            return Err(AnalysisError::invalid_budget(format!(
                "item '{}' is both mandatory and excluded",
                id
            )));
        }

        let (min, max) = constraint.bounds();
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && min <= max) {
            return Err(AnalysisError::invalid_budget(format!(
                "per-item bounds [{}, {}] are invalid",
                min, max
            )));
        }
        Ok(())
    }
}
