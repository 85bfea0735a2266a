//! Ordinary least squares via singular value decomposition
//!
//! Singular values at or below `max(n, p) · ε · σ_max` are treated as zero,
//! which yields the minimum-norm solution for singular or ill-conditioned
//! designs instead of an error.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, warn};

use iv_core::data::stats;

use crate::base::{ModelError, ModelStatistics, ModelType, Result};
use crate::lm::RegressionResult;

// ==================== Type Definitions ====================

/// Matrix type alias for 2D arrays
pub type Matrix = Array2<f64>;

/// Vector type alias for 1D arrays
pub type Vector = Array1<f64>;

/// Name of the prepended constant column
const INTERCEPT_NAME: &str = "(Intercept)";

// ==================== Least Squares Solver ====================

/// Least-squares fit of a response on an intercept plus regressors
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// Which regression this fit represents
    model_type: ModelType,
    /// Response name used in summaries
    response_name: String,
    /// Regressor names used in summaries
    regressor_names: Vec<String>,
}

impl Default for LeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl LeastSquares {
    /// Create a new solver
    pub fn new() -> Self {
        Self {
            model_type: ModelType::Other("Least Squares".to_string()),
            response_name: "y".to_string(),
            regressor_names: Vec::new(),
        }
    }

    /// Set the model type reported in summaries
    pub fn model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    /// Set response and regressor names
    pub fn names(mut self, response: &str, regressors: &[&str]) -> Self {
        self.response_name = response.to_string();
        self.regressor_names = regressors.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Regress `y` on `[1, regressors...]`
    pub fn fit(
        &self,
        y: ArrayView1<'_, f64>,
        regressors: &[ArrayView1<'_, f64>],
    ) -> Result<RegressionResult> {
        let n = y.len();
        if n == 0 {
            return Err(ModelError::InsufficientData { n_samples: 0 });
        }

        let x = design_matrix(regressors, n)?;
        let p = x.ncols();

        let solution = svd_solve(&x, &y.to_owned())?;
        if solution.rank < p {
            warn!(
                rank = solution.rank,
                columns = p,
                "rank-deficient design, using minimum-norm solution"
            );
        }

        let fitted_values = x.dot(&solution.coefficients);
        let residuals = &y - &fitted_values;

        let ssr = residuals.dot(&residuals);
        let tss = stats::total_sum_of_squares(y);
        let r_squared = if has_variation(tss, y) {
            1.0 - ssr / tss
        } else {
            0.0
        };

        let df_residual = n.saturating_sub(solution.rank);
        let adj_r_squared = (df_residual > 0 && n > 1 && has_variation(tss, y))
            .then(|| 1.0 - (1.0 - r_squared) * ((n as f64 - 1.0) / df_residual as f64));
        let sigma2 = (df_residual > 0).then(|| ssr / df_residual as f64);

        let standard_errors = sigma2.map(|s2| {
            solution
                .unscaled_covariance
                .diag()
                .mapv(|v| (s2 * v).max(0.0).sqrt())
        });

        debug!(
            model = %self.model_type,
            n,
            rank = solution.rank,
            r_squared,
            "least-squares fit"
        );

        Ok(RegressionResult {
            coefficients: solution.coefficients,
            standard_errors,
            fitted_values,
            residuals,
            unscaled_covariance: solution.unscaled_covariance,
            variable_names: self.variable_names(p),
            response_name: self.response_name.clone(),
            model_type: self.model_type.clone(),
            model_statistics: ModelStatistics {
                r_squared,
                adj_r_squared,
                residual_std_error: sigma2.map(f64::sqrt),
                ssr,
                tss,
                df_residual,
                rank: solution.rank,
            },
        })
    }

    fn variable_names(&self, p: usize) -> Vec<String> {
        let mut names = vec![INTERCEPT_NAME.to_string()];
        for j in 1..p {
            names.push(
                self.regressor_names
                    .get(j - 1)
                    .cloned()
                    .unwrap_or_else(|| format!("x{}", j)),
            );
        }
        names
    }
}

/// Build `[1, regressors...]` for `n` observations
pub fn design_matrix(regressors: &[ArrayView1<'_, f64>], n: usize) -> Result<Matrix> {
    let mut x = Matrix::ones((n, regressors.len() + 1));

    for (j, column) in regressors.iter().enumerate() {
        if column.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: column.len(),
            });
        }
        x.column_mut(j + 1).assign(column);
    }

    Ok(x)
}

/// Whether the response varies enough for R² to be meaningful
fn has_variation(tss: f64, y: ArrayView1<'_, f64>) -> bool {
    tss > f64::EPSILON * y.dot(&y).max(f64::MIN_POSITIVE)
}

// ==================== SVD Solve ====================

struct SvdSolution {
    coefficients: Vector,
    /// `(X'X)⁺`, restricted to the retained singular directions
    unscaled_covariance: Matrix,
    rank: usize,
}

/// Solve `min ‖y − Xβ‖²` with the minimum-norm β
fn svd_solve(x: &Matrix, y: &Vector) -> Result<SvdSolution> {
    let (n, p) = x.dim();
    let xm = DMatrix::from_fn(n, p, |i, j| x[[i, j]]);
    let yv = DVector::from_iterator(n, y.iter().copied());

    let svd = xm.svd(true, true);
    let max_sv = svd.singular_values.max();
    let tol = (max_sv * n.max(p) as f64 * f64::EPSILON).max(f64::MIN_POSITIVE);

    let beta = svd
        .solve(&yv, tol)
        .map_err(|e| ModelError::NumericalError {
            message: format!("SVD least squares failed: {}", e),
            operation: "svd_solve".to_string(),
        })?;

    let v_t = svd.v_t.as_ref().ok_or_else(|| ModelError::NumericalError {
        message: "right singular vectors were not computed".to_string(),
        operation: "svd_solve".to_string(),
    })?;

    let mut unscaled_covariance = Matrix::zeros((p, p));
    let mut rank = 0;
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s <= tol {
            continue;
        }
        rank += 1;
        let w = 1.0 / (s * s);
        for a in 0..p {
            for b in 0..p {
                unscaled_covariance[[a, b]] += w * v_t[(k, a)] * v_t[(k, b)];
            }
        }
    }

    Ok(SvdSolution {
        coefficients: beta.iter().copied().collect(),
        unscaled_covariance,
        rank,
    })
}
