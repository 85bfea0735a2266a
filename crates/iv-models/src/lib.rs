//! Estimators and diagnostics for IvOxide
//!
//! This crate fits OLS and Two-Stage Least Squares on data drawn by
//! `iv-core`, judges the instrument (first-stage F, association, bias) and
//! analyzes the Local Average Treatment Effect under heterogeneous effects.
//! [`run_simulation`] chains all of it for one configuration.

pub mod base;
pub mod error;
pub mod iv;
pub mod lm;
pub mod simulation;

pub use base::{Coefficient, ModelResultTrait, ModelStatistics, ModelSummary, ModelType, Result};
pub use error::ModelError;
pub use iv::{
    DiagnosticResults, Diagnostics, LateAnalysis, LateAnalyzer, TwoStageLeastSquares,
    TwoStageResult, two_stage_least_squares,
};
pub use lm::{LeastSquares, RegressionResult, ols};
pub use simulation::{SimulationOutcome, SimulationWarning, run_simulation};
