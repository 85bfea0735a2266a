//! Statistical structures for model results

use serde::{Deserialize, Serialize};

/// Goodness-of-fit statistics of one regression
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    /// R-squared, 0 when the response is constant
    pub r_squared: f64,
    /// Adjusted R-squared
    pub adj_r_squared: Option<f64>,
    /// Residual standard error
    pub residual_std_error: Option<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    /// Total sum of squares
    pub tss: f64,
    /// Residual degrees of freedom
    pub df_residual: usize,
    /// Numerical rank of the design matrix
    pub rank: usize,
}
