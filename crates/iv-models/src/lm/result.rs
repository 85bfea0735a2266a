//! Linear regression result structure
//!
//! This module defines the result of one least-squares fit: the
//! coefficient vector, fitted values, residuals and goodness of fit.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

use crate::{
    base::{Coefficient, ModelResultTrait, ModelStatistics, ModelSummary, ModelType},
    lm::ols::{Matrix, Vector},
};

/// Least-squares regression result
#[derive(Debug, Clone, Serialize)]
pub struct RegressionResult {
    /// Coefficients, intercept first
    pub coefficients: Vector,
    /// Homoskedastic standard errors; `None` without residual degrees of freedom
    pub standard_errors: Option<Vector>,
    /// Fitted values (ŷ)
    pub fitted_values: Vector,
    /// Residuals (y - ŷ)
    pub residuals: Vector,
    /// `(X'X)⁺`, the coefficient covariance before scaling by σ²
    pub unscaled_covariance: Matrix,
    /// Variable names, intercept first
    pub variable_names: Vec<String>,
    /// Response name
    pub response_name: String,
    /// Which regression this is
    pub model_type: ModelType,
    /// Model statistics
    pub model_statistics: ModelStatistics,
}

impl RegressionResult {
    /// Get the number of observations
    pub fn n_obs(&self) -> usize {
        self.fitted_values.len()
    }

    /// Get the number of coefficients (including intercept)
    pub fn n_predictors(&self) -> usize {
        self.coefficients.len()
    }

    /// Get sum of squared residuals
    pub fn ssr(&self) -> f64 {
        self.model_statistics.ssr
    }

    /// Get total sum of squares
    pub fn tss(&self) -> f64 {
        self.model_statistics.tss
    }

    /// Numerical rank of the design matrix
    pub fn rank(&self) -> usize {
        self.model_statistics.rank
    }

    /// Whether the minimum-norm fallback was used
    pub fn is_rank_deficient(&self) -> bool {
        self.rank() < self.n_predictors()
    }

    /// Predict for new regressor rows (without the intercept column)
    pub fn predict(&self, regressors: &Matrix) -> Vector {
        let intercept = self.coefficients[0];
        let slopes = self.coefficients.slice(ndarray::s![1..]);
        regressors.dot(&slopes) + intercept
    }
}

/// Build the coefficient table from estimates and optional standard errors
pub(crate) fn coefficient_table(
    names: &[String],
    coefficients: &Vector,
    standard_errors: Option<&Vector>,
    df_residual: usize,
) -> Vec<Coefficient> {
    let t_dist = (df_residual > 0)
        .then(|| StudentsT::new(0.0, 1.0, df_residual as f64).ok())
        .flatten();

    coefficients
        .iter()
        .enumerate()
        .map(|(i, &coef)| {
            let name = names.get(i).cloned().unwrap_or_else(|| format!("x{}", i));
            let mut coefficient = Coefficient::new(name, coef);
            if i == 0 {
                coefficient = coefficient.as_intercept();
            }

            let se = standard_errors.map(|se| se[i]).filter(|&se| se > 0.0);
            if let Some(se) = se {
                let t = coef / se;
                coefficient = coefficient.with_std_error(se).with_t_stat(t);
                if let Some(dist) = &t_dist {
                    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
                    coefficient = coefficient.with_p_value(p.clamp(0.0, 1.0));
                }
            }

            coefficient
        })
        .collect()
}

impl ModelResultTrait for RegressionResult {
    fn coefficients(&self) -> &Vector {
        &self.coefficients
    }

    fn fitted_values(&self) -> &Vector {
        &self.fitted_values
    }

    fn residuals(&self) -> &Vector {
        &self.residuals
    }

    fn r_squared(&self) -> f64 {
        self.model_statistics.r_squared
    }

    fn coefficient_table(&self) -> Vec<Coefficient> {
        coefficient_table(
            &self.variable_names,
            &self.coefficients,
            self.standard_errors.as_ref(),
            self.model_statistics.df_residual,
        )
    }

    fn summary(&self) -> ModelSummary {
        let regressors = self.variable_names[1..].join(" + ");
        ModelSummary {
            model_type: self.model_type.clone(),
            formula: format!("{} ~ {}", self.response_name, regressors),
            n_obs: self.n_obs(),
            coefficients: self.coefficient_table(),
            model_statistics: self.model_statistics,
        }
    }
}

impl fmt::Display for RegressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
