//! Domain layer containing the computation logic and its value types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (errors, evaluator weight, float helpers)
//! - `ahp` - Matrices, priorities, consistency, hierarchy, group and sensitivity
//! - `budget` - Knapsack and continuous allocation, scenarios, efficiency shortlist

pub mod ahp;
pub mod budget;
pub mod foundation;
