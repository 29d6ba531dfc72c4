//! Application handlers.
//!
//! Command handlers that run the domain services end to end.

pub mod budget;
pub mod evaluation;

pub use budget::{BudgetPlan, PlanBudgetCommand, PlanBudgetHandler};
pub use evaluation::{
    AnalyzeSensitivityCommand, AnalyzeSensitivityHandler, SensitivityAnalysis,
    DecisionEvaluation, EvaluateDecisionCommand, EvaluateDecisionHandler, EvaluatorJudgment,
    JudgmentAssessment, NodePriorities,
};
