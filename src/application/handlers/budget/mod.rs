//! Budget planning handlers.

mod plan_budget;

pub use plan_budget::{BudgetPlan, PlanBudgetCommand, PlanBudgetHandler};
