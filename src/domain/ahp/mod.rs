//! AHP Module - Pure domain services for the Analytic Hierarchy Process.
//!
//! # Components
//!
//! - `MatrixValidator` - Reciprocity repair and validation of pairwise judgments
//! - `PriorityDeriver` - Row geometric mean priorities
//! - `ConsistencyEvaluator` - Saaty CI/CR with an injected threshold
//! - `HierarchyAggregator` - Global weights and composite alternative scores
//! - `GroupAggregator` - Weighted geometric mean across evaluators
//! - `SensitivityAnalyzer` - Rankings under adjusted criterion weights
//!
//! All services are stateless apart from their configuration. They take
//! validated values and return computed results; no I/O happens here.

mod consistency;
mod group;
mod hierarchy;
mod matrix;
mod priority;
mod sensitivity;

pub use consistency::{random_index, ConsistencyEvaluator, ConsistencyReport, JudgmentRevision, RANDOM_INDEX};
pub use group::{GroupAggregator, GroupInput, GroupPriorities};
pub use hierarchy::{
    AlternativeScores, CriteriaHierarchy, CriterionNode, HierarchyAggregator, HierarchyInput,
    HierarchyInputBuilder, NodeInput, RankedAlternative, Ranking,
};
pub use matrix::{
    ComparisonMatrix, MatrixInput, MatrixValidator, MatrixWarning, ValidatedMatrix, SAATY_MAX,
    SAATY_MIN,
};
pub use priority::{PriorityDeriver, PriorityVector};
pub use sensitivity::{
    RankReversal, SensitivityAnalyzer, SensitivityPoint, SensitivityRequest, SensitivitySweep,
    WeightAdjustments,
};
