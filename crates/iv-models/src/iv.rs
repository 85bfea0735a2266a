//! Instrumental-variables estimation
//!
//! 2SLS with a single endogenous regressor and a single instrument, the
//! diagnostics that judge the instrument, and the LATE analysis of the
//! heterogeneous-effects model.

pub mod diagnostics;
pub mod late;
pub mod two_stage;

#[cfg(test)]
mod tests;

// Re-exports
pub use diagnostics::{
    BiasMetrics, DiagnosticResults, Diagnostics, FStatistic, FirstStageDiagnostics,
    STOCK_YOGO_10PCT, WEAK_INSTRUMENT_THRESHOLD,
};
pub use late::{LateAnalysis, LateAnalyzer, TypeContribution, WaldEstimate};
pub use two_stage::{TwoStageLeastSquares, TwoStageResult, two_stage_least_squares};
