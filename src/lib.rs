//! AHP Engine - Analytic Hierarchy Process computation core
//!
//! This crate turns pairwise judgments into validated priority weights,
//! propagates them through a criteria hierarchy, aggregates evaluators,
//! analyses ranking sensitivity and optimizes budgets over the resulting scores.

pub mod application;
pub mod config;
pub mod domain;
pub mod telemetry;
