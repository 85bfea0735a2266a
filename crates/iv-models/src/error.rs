//! Model-related error types

use thiserror::Error;

use iv_core::CoreError;

/// Model-related errors
///
/// Numerical degeneracies of the estimators (singular designs, vanishing
/// denominators) are not errors; they surface as flags on the results.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Configuration or data-generation error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Numerical computation error
    #[error("Numerical error: {message} (operation: {operation})")]
    NumericalError {
        /// Error message
        message: String,
        /// Operation that failed
        operation: String,
    },

    /// Response and regressors disagree in length
    #[error("Dimension mismatch: expected {expected} rows, got {actual}")]
    DimensionMismatch {
        /// Length of the response vector
        expected: usize,
        /// Length of the offending regressor
        actual: usize,
    },

    /// Input not suited to the requested analysis
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String,
    },

    /// Insufficient data for model fitting
    #[error("Not enough data: {n_samples} samples")]
    InsufficientData {
        /// Number of samples
        n_samples: usize,
    },
}
