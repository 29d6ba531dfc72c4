//! Budget optimization configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Size limits that keep a single optimization call predictable
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BudgetConfig {
    /// Upper bound on exact knapsack work: DP table cells (items × budget
    /// units) or Pareto frontier states. Larger instances are solved on a
    /// rounded grid of this size.
    #[serde(default = "default_max_dp_cells")]
    pub max_dp_cells: usize,

    /// Largest accepted item list
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl BudgetConfig {
    /// Validate budget configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_items == 0 {
            return Err(ValidationError::InvalidLimit("budget.max_items"));
        }
        // One cell per item plus the zero-capacity column at minimum
        if self.max_dp_cells < 2 * self.max_items {
            return Err(ValidationError::InvalidLimit("budget.max_dp_cells"));
        }
        Ok(())
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_dp_cells: default_max_dp_cells(),
            max_items: default_max_items(),
        }
    }
}

fn default_max_dp_cells() -> usize {
    100_000
}

fn default_max_items() -> usize {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_config_defaults() {
        let config = BudgetConfig::default();
        assert_eq!(config.max_dp_cells, 100_000);
        assert_eq!(config.max_items, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dp_cells_must_cover_items() {
        let config = BudgetConfig {
            max_dp_cells: 10,
            max_items: 10,
        };
        assert!(config.validate().is_err());
    }
}
