//! Core traits and types for estimation results
//!
//! Every estimator in this crate reports through the same
//! [`ModelResultTrait`], so the presentation layer can render OLS and 2SLS
//! results side by side without knowing which one it holds.

use ndarray::Array1;

// Re-export core types
pub use coefficient::Coefficient;
pub use statistics::ModelStatistics;
pub use summary::ModelSummary;
pub use summary::ModelType;

pub use crate::error::ModelError;

pub mod coefficient;
pub mod statistics;
pub mod summary;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Trait for model results
pub trait ModelResultTrait: Send + Sync {
    /// Get coefficient estimates, intercept first
    fn coefficients(&self) -> &Array1<f64>;

    /// Get fitted values
    fn fitted_values(&self) -> &Array1<f64>;

    /// Get residuals
    fn residuals(&self) -> &Array1<f64>;

    /// Get R-squared value
    fn r_squared(&self) -> f64;

    /// Get the coefficient table
    fn coefficient_table(&self) -> Vec<Coefficient>;

    /// Generate model summary
    fn summary(&self) -> ModelSummary;

    /// Slope on the (single) regressor
    fn slope(&self) -> f64 {
        self.coefficients().get(1).copied().unwrap_or(0.0)
    }

    /// Intercept
    fn intercept(&self) -> f64 {
        self.coefficients().get(0).copied().unwrap_or(0.0)
    }
}
