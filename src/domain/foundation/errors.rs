//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Structural reason a comparison matrix was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixDefect {
    NotSquare,
    LabelMismatch,
    NonPositiveEntry,
    NonFiniteEntry,
    Empty,
}

impl fmt::Display for MatrixDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatrixDefect::NotSquare => "matrix is not square",
            MatrixDefect::LabelMismatch => "label count does not match matrix size",
            MatrixDefect::NonPositiveEntry => "matrix contains a non-positive entry",
            MatrixDefect::NonFiniteEntry => "matrix contains a non-finite entry",
            MatrixDefect::Empty => "matrix has no elements",
        };
        write!(f, "{}", s)
    }
}

/// Structural reason a criteria hierarchy was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyDefect {
    DuplicateNode(String),
    UnknownParent { node_id: String, parent_id: String },
    Cycle(String),
    LevelMismatch { node_id: String, declared: u8, actual: usize },
    MissingLocalWeight(String),
    InvalidLocalWeight(String),
    SiblingWeightsNotNormalized { parent_id: Option<String> },
    UnknownCriterion(String),
}

impl fmt::Display for HierarchyDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyDefect::DuplicateNode(id) => write!(f, "duplicate node '{}'", id),
            HierarchyDefect::UnknownParent { node_id, parent_id } => {
                write!(f, "node '{}' references unknown parent '{}'", node_id, parent_id)
            }
            HierarchyDefect::Cycle(id) => write!(f, "node '{}' is part of a cycle", id),
            HierarchyDefect::LevelMismatch {
                node_id,
                declared,
                actual,
            } => write!(
                f,
                "node '{}' declares level {} but sits at depth {}",
                node_id, declared, actual
            ),
            HierarchyDefect::MissingLocalWeight(id) => {
                write!(f, "no local weight supplied for node '{}'", id)
            }
            HierarchyDefect::InvalidLocalWeight(id) => {
                write!(f, "local weight of node '{}' is outside [0, 1]", id)
            }
            HierarchyDefect::SiblingWeightsNotNormalized { parent_id } => write!(
                f,
                "local weights under '{}' do not sum to 1",
                parent_id.as_deref().unwrap_or("goal")
            ),
            HierarchyDefect::UnknownCriterion(id) => write!(f, "unknown criterion '{}'", id),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidMatrix,
    InvalidHierarchy,
    InvalidPriorityVector,
    InvalidEvaluatorWeight,
    InvalidBudgetInput,
    InvalidSensitivityInput,
    InvalidTopK,
    MissingJudgment,

    // Computation errors
    HierarchyTooDeep,
    DegenerateSensitivityInput,
    BudgetInfeasible,
    SizeLimitExceeded,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidMatrix => "INVALID_MATRIX",
            ErrorCode::InvalidHierarchy => "INVALID_HIERARCHY",
            ErrorCode::InvalidPriorityVector => "INVALID_PRIORITY_VECTOR",
            ErrorCode::InvalidEvaluatorWeight => "INVALID_EVALUATOR_WEIGHT",
            ErrorCode::InvalidBudgetInput => "INVALID_BUDGET_INPUT",
            ErrorCode::InvalidSensitivityInput => "INVALID_SENSITIVITY_INPUT",
            ErrorCode::InvalidTopK => "INVALID_TOP_K",
            ErrorCode::MissingJudgment => "MISSING_JUDGMENT",
            ErrorCode::HierarchyTooDeep => "HIERARCHY_TOO_DEEP",
            ErrorCode::DegenerateSensitivityInput => "DEGENERATE_SENSITIVITY_INPUT",
            ErrorCode::BudgetInfeasible => "BUDGET_INFEASIBLE",
            ErrorCode::SizeLimitExceeded => "SIZE_LIMIT_EXCEEDED",
        };
        write!(f, "{}", s)
    }
}

/// Failures surfaced by the AHP and budget computations.
///
/// Every variant is detected before or instead of producing a degenerate
/// result; nothing in the core substitutes placeholder values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid comparison matrix: {reason}")]
    InvalidMatrix { reason: MatrixDefect },

    #[error("Invalid criteria hierarchy: {reason}")]
    InvalidHierarchy { reason: HierarchyDefect },

    #[error("Hierarchy depth {depth} exceeds the maximum of {max_depth} levels")]
    HierarchyTooDeep { depth: usize, max_depth: usize },

    #[error("Invalid priority vector: {reason}")]
    InvalidPriorityVector { reason: String },

    #[error("Evaluator '{evaluator_id}' has invalid weight {weight}")]
    InvalidEvaluatorWeight { evaluator_id: String, weight: f64 },

    #[error("Criterion '{criterion_id}' already carries all of its sibling weight")]
    DegenerateSensitivityInput { criterion_id: String },

    #[error("Invalid sensitivity input: {reason}")]
    InvalidSensitivityInput { reason: String },

    #[error("Mandatory items require {required} but only {available} is budgeted")]
    BudgetInfeasible { required: f64, available: f64 },

    #[error("Invalid budget input: {reason}")]
    InvalidBudgetInput { reason: String },

    #[error("top-k must be at least 1, got {k}")]
    InvalidTopK { k: usize },

    #[error("{what} of {actual} exceeds the limit of {limit}")]
    SizeLimitExceeded {
        what: &'static str,
        limit: usize,
        actual: usize,
    },

    #[error("No judgment supplied for '{node}'")]
    MissingJudgment { node: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnalysisError {
    /// Creates an invalid matrix error.
    pub fn invalid_matrix(reason: MatrixDefect) -> Self {
        AnalysisError::InvalidMatrix { reason }
    }

    /// Creates an invalid hierarchy error.
    pub fn invalid_hierarchy(reason: HierarchyDefect) -> Self {
        AnalysisError::InvalidHierarchy { reason }
    }

    /// Creates an invalid budget input error.
    pub fn invalid_budget(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidBudgetInput {
            reason: reason.into(),
        }
    }

    /// Creates an invalid sensitivity input error.
    pub fn invalid_sensitivity(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidSensitivityInput {
            reason: reason.into(),
        }
    }

    /// Creates an invalid priority vector error.
    pub fn invalid_priorities(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidPriorityVector {
            reason: reason.into(),
        }
    }

    /// Returns the stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::InvalidMatrix { .. } => ErrorCode::InvalidMatrix,
            AnalysisError::InvalidHierarchy { .. } => ErrorCode::InvalidHierarchy,
            AnalysisError::HierarchyTooDeep { .. } => ErrorCode::HierarchyTooDeep,
            AnalysisError::InvalidPriorityVector { .. } => ErrorCode::InvalidPriorityVector,
            AnalysisError::InvalidEvaluatorWeight { .. } => ErrorCode::InvalidEvaluatorWeight,
            AnalysisError::DegenerateSensitivityInput { .. } => {
                ErrorCode::DegenerateSensitivityInput
            }
            AnalysisError::InvalidSensitivityInput { .. } => ErrorCode::InvalidSensitivityInput,
            AnalysisError::BudgetInfeasible { .. } => ErrorCode::BudgetInfeasible,
            AnalysisError::InvalidBudgetInput { .. } => ErrorCode::InvalidBudgetInput,
            AnalysisError::InvalidTopK { .. } => ErrorCode::InvalidTopK,
            AnalysisError::SizeLimitExceeded { .. } => ErrorCode::SizeLimitExceeded,
            AnalysisError::MissingJudgment { .. } => ErrorCode::MissingJudgment,
            AnalysisError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }
}
