//! Budget Module - Funding decisions over scored alternatives.
//!
//! # Components
//!
//! - `BudgetOptimizer` - Binary (0/1 knapsack) and continuous (water-filling) modes
//! - `ScenarioRunner` - Re-optimization across budget deltas with stability classes
//! - `EfficiencyRecommender` - Utility-per-cost shortlist

mod allocation;
mod efficiency;
mod item;
mod knapsack;
mod optimizer;
mod scenario;

pub use efficiency::{EfficiencyRank, EfficiencyRecommender};
pub use item::{
    Allocation, BudgetConstraint, BudgetItem, BudgetRequest, OptimizationMode, OptimizationResult,
    Selection,
};
pub use optimizer::BudgetOptimizer;
pub use scenario::{
    ItemStability, ScenarioOutcome, ScenarioReport, ScenarioRequest, ScenarioResult,
    ScenarioRunner, StabilityClass,
};
