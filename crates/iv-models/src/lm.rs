//! Linear least squares
//!
//! One solver serves every regression in the crate: the direct OLS fit of
//! outcome on treatment and both stages of 2SLS. Only the vectors passed in
//! differ.
//!
//! The solver prepends an intercept column and solves by SVD, falling back
//! to the minimum-norm solution when the design is rank deficient.

pub mod ols;
pub mod result;


// Re-exports
pub use ols::{LeastSquares, Matrix, Vector, design_matrix};
pub use result::RegressionResult;

use ndarray::ArrayView1;

use crate::base::{ModelType, Result};

/// Convenience function: regress `y` on `[1, x]`
pub fn ols(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> Result<RegressionResult> {
    LeastSquares::new()
        .model_type(ModelType::Ols)
        .names("y", &["x"])
        .fit(y, &[x])
}
