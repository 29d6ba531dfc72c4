//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates the pure domain services into complete use cases:
//! evaluating a decision from raw judgments and planning a budget from scores.

pub mod handlers;

pub use handlers::{
    // Evaluation
    AnalyzeSensitivityCommand, AnalyzeSensitivityHandler, SensitivityAnalysis,
    DecisionEvaluation, EvaluateDecisionCommand, EvaluateDecisionHandler, EvaluatorJudgment,
    JudgmentAssessment, NodePriorities,
    // Budget
    BudgetPlan, PlanBudgetCommand, PlanBudgetHandler,
};
