//! Budget item, constraint and result contracts shared by every optimization mode.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::AnalysisError;

/// A fundable alternative with its cost and (usually AHP-derived) utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cost: f64,
    pub utility: f64,
}

impl BudgetItem {
    /// Creates an item named after its id.
    pub fn new(id: impl Into<String>, cost: f64, utility: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            cost,
            utility,
        }
    }

    /// Sets a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Utility per unit of cost.
    ///
    /// A free item is infinitely efficient when it has any utility and
    /// worthless otherwise.
    pub fn efficiency(&self) -> f64 {
        if self.cost > 0.0 {
            self.utility / self.cost
        } else if self.utility > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    pub(crate) fn check(&self) -> Result<(), AnalysisError> {
        if self.id.is_empty() {
            return Err(AnalysisError::invalid_budget("item id is empty"));
        }
        if !(self.cost.is_finite() && self.cost >= 0.0) {
            return Err(AnalysisError::invalid_budget(format!(
                "item '{}' has invalid cost {}",
                self.id, self.cost
            )));
        }
        if !(self.utility.is_finite() && self.utility >= 0.0) {
            return Err(AnalysisError::invalid_budget(format!(
                "item '{}' has invalid utility {}",
                self.id, self.utility
            )));
        }
        Ok(())
    }
}

/// Budget ceiling plus forced inclusions, exclusions and per-item bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetConstraint {
    pub total_budget: f64,
    #[serde(default)]
    pub mandatory_item_ids: Vec<String>,
    #[serde(default)]
    pub excluded_item_ids: Vec<String>,
    /// Continuous mode only; defaults to 0.
    #[serde(default)]
    pub min_budget_per_item: Option<f64>,
    /// Continuous mode only; defaults to `total_budget`.
    #[serde(default)]
    pub max_budget_per_item: Option<f64>,
}

impl BudgetConstraint {
    /// Creates a constraint with only a budget ceiling.
    pub fn new(total_budget: f64) -> Self {
        Self {
            total_budget,
            ..Default::default()
        }
    }

    /// Forces the given items into every solution.
    pub fn with_mandatory(mut self, ids: &[&str]) -> Self {
        self.mandatory_item_ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Removes the given items from consideration.
    pub fn with_excluded(mut self, ids: &[&str]) -> Self {
        self.excluded_item_ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sets per-item allocation bounds for continuous mode.
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_budget_per_item = Some(min);
        self.max_budget_per_item = Some(max);
        self
    }

    /// Returns the same constraint with a different ceiling.
    pub fn with_total_budget(&self, total_budget: f64) -> Self {
        Self {
            total_budget,
            ..self.clone()
        }
    }

    pub(crate) fn is_mandatory(&self, id: &str) -> bool {
        self.mandatory_item_ids.iter().any(|m| m == id)
    }

    pub(crate) fn is_excluded(&self, id: &str) -> bool {
        self.excluded_item_ids.iter().any(|e| e == id)
    }

    /// Lower and upper allocation bounds with defaults applied.
    pub(crate) fn bounds(&self) -> (f64, f64) {
        (
            self.min_budget_per_item.unwrap_or(0.0),
            self.max_budget_per_item.unwrap_or(self.total_budget),
        )
    }
}

/// How item funding is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    /// Each item is either fully funded or not at all.
    #[default]
    Binary,
    /// Items receive any amount within the per-item bounds.
    Continuous,
}

/// A complete optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    pub items: Vec<BudgetItem>,
    pub constraint: BudgetConstraint,
    #[serde(default)]
    pub mode: OptimizationMode,
}

impl BudgetRequest {
    /// Creates a binary-mode request.
    pub fn binary(items: Vec<BudgetItem>, constraint: BudgetConstraint) -> Self {
        Self {
            items,
            constraint,
            mode: OptimizationMode::Binary,
        }
    }

    /// Creates a continuous-mode request.
    pub fn continuous(items: Vec<BudgetItem>, constraint: BudgetConstraint) -> Self {
        Self {
            items,
            constraint,
            mode: OptimizationMode::Continuous,
        }
    }
}

/// Amount given to one item in continuous mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub item_id: String,
    pub amount: f64,
    pub utility: f64,
}

/// Mode-specific part of an optimization result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Selection {
    #[serde(rename_all = "camelCase")]
    Binary { selected_item_ids: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Continuous { allocations: Vec<Allocation> },
}

/// Outcome of one optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    #[serde(flatten)]
    pub selection: Selection,
    pub total_cost: f64,
    pub total_utility: f64,
    /// `total_cost / total_budget`, 0 for a zero budget.
    pub utilization_ratio: f64,
    pub unused_budget: f64,
}

impl OptimizationResult {
    pub(crate) fn new(selection: Selection, total_cost: f64, total_utility: f64, total_budget: f64) -> Self {
        let utilization_ratio = if total_budget > 0.0 {
            total_cost / total_budget
        } else {
            0.0
        };
        Self {
            selection,
            total_cost,
            total_utility,
            utilization_ratio,
            unused_budget: (total_budget - total_cost).max(0.0),
        }
    }

    /// Ids of items that received any funding, in input order.
    pub fn funded_item_ids(&self) -> Vec<&str> {
        match &self.selection {
            Selection::Binary { selected_item_ids } => {
                selected_item_ids.iter().map(String::as_str).collect()
            }
            Selection::Continuous { allocations } => allocations
                .iter()
                .filter(|a| a.amount > 0.0)
                .map(|a| a.item_id.as_str())
                .collect(),
        }
    }

    /// Returns true if the item received any funding.
    pub fn is_funded(&self, item_id: &str) -> bool {
        self.funded_item_ids().contains(&item_id)
    }

    /// Amount allocated to an item; `None` in binary mode.
    pub fn allocation_of(&self, item_id: &str) -> Option<f64> {
        match &self.selection {
            Selection::Binary { .. } => None,
            Selection::Continuous { allocations } => allocations
                .iter()
                .find(|a| a.item_id == item_id)
                .map(|a| a.amount),
        }
    }
}
