//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, numeric helpers and error types
//! that form the vocabulary of the AHP engine.

mod errors;
mod numeric;
mod weight;

pub use errors::{AnalysisError, ErrorCode, HierarchyDefect, MatrixDefect, ValidationError};
pub use numeric::{all_non_negative, approx_eq, normalize, WEIGHT_SUM_TOLERANCE};
pub use weight::EvaluatorWeight;
