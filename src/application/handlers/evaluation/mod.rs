//! Decision evaluation handlers.

mod analyze_sensitivity;
mod evaluate_decision;

pub use analyze_sensitivity::{
    AnalyzeSensitivityCommand, AnalyzeSensitivityHandler, SensitivityAnalysis,
};
pub use evaluate_decision::{
    DecisionEvaluation, EvaluateDecisionCommand, EvaluateDecisionHandler, EvaluatorJudgment,
    JudgmentAssessment, NodePriorities,
};
