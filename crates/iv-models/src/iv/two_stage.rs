//! Two-Stage Least Squares (2SLS)
//!
//! Stage 1 regresses the endogenous treatment on `[1, Z]` and keeps the
//! fitted values X̂. Stage 2 regresses the outcome on `[1, X̂]`; its slope is
//! the 2SLS estimate. Both stages use the same least-squares solver as the
//! direct OLS fit.
//!
//! Standard errors follow the usual 2SLS convention: residuals are formed
//! with the original treatment, `Y − b0 − b1·X`, while the covariance is
//! taken from the projected design, `σ² (X̂'X̂)⁺`.

use ndarray::ArrayView1;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::base::{Coefficient, ModelResultTrait, ModelSummary, ModelType, Result};
use crate::lm::result::coefficient_table;
use crate::lm::{LeastSquares, RegressionResult, Vector};

/// Result of a 2SLS fit
#[derive(Debug, Clone, Serialize)]
pub struct TwoStageResult {
    /// Treatment regressed on the instrument
    pub first_stage: RegressionResult,
    /// Outcome regressed on the first-stage fitted treatment
    pub second_stage: RegressionResult,
    /// `Y − b0 − b1·X` with the original treatment
    pub structural_residuals: Vector,
    /// 2SLS standard errors; `None` without residual degrees of freedom
    pub standard_errors: Option<Vector>,
    /// Name of the endogenous regressor
    pub endogenous_name: String,
}

impl TwoStageResult {
    /// The 2SLS point estimate (stage-2 slope)
    pub fn estimate(&self) -> f64 {
        self.second_stage.slope()
    }

    /// First-stage fitted treatment X̂
    pub fn fitted_treatment(&self) -> &Vector {
        &self.first_stage.fitted_values
    }

    fn coefficient_names(&self) -> Vec<String> {
        vec![
            self.second_stage.variable_names[0].clone(),
            self.endogenous_name.clone(),
        ]
    }
}

impl ModelResultTrait for TwoStageResult {
    fn coefficients(&self) -> &Vector {
        &self.second_stage.coefficients
    }

    fn fitted_values(&self) -> &Vector {
        &self.second_stage.fitted_values
    }

    fn residuals(&self) -> &Vector {
        &self.structural_residuals
    }

    fn r_squared(&self) -> f64 {
        self.second_stage.r_squared()
    }

    fn coefficient_table(&self) -> Vec<Coefficient> {
        coefficient_table(
            &self.coefficient_names(),
            &self.second_stage.coefficients,
            self.standard_errors.as_ref(),
            self.second_stage.model_statistics.df_residual,
        )
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary {
            model_type: ModelType::TwoStageLeastSquares,
            formula: format!(
                "{} ~ {} (instrumented)",
                self.second_stage.response_name, self.endogenous_name
            ),
            n_obs: self.second_stage.n_obs(),
            coefficients: self.coefficient_table(),
            model_statistics: self.second_stage.model_statistics,
        }
    }
}

impl fmt::Display for TwoStageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Two-Stage Least Squares estimator with one endogenous regressor and one instrument
#[derive(Debug, Clone)]
pub struct TwoStageLeastSquares {
    response: String,
    endogenous: String,
    instrument: String,
}

impl Default for TwoStageLeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl TwoStageLeastSquares {
    /// Create an estimator with default variable names `Y`, `X`, `Z`
    pub fn new() -> Self {
        Self {
            response: "Y".to_string(),
            endogenous: "X".to_string(),
            instrument: "Z".to_string(),
        }
    }

    /// Set variable names used in summaries
    pub fn names(mut self, response: &str, endogenous: &str, instrument: &str) -> Self {
        self.response = response.to_string();
        self.endogenous = endogenous.to_string();
        self.instrument = instrument.to_string();
        self
    }

    /// Fit both stages
    pub fn fit(
        &self,
        y: ArrayView1<'_, f64>,
        x: ArrayView1<'_, f64>,
        z: ArrayView1<'_, f64>,
    ) -> Result<TwoStageResult> {
        let first_stage = LeastSquares::new()
            .model_type(ModelType::FirstStage)
            .names(&self.endogenous, &[self.instrument.as_str()])
            .fit(x, &[z])?;

        let fitted_name = format!("{}_hat", self.endogenous);
        let second_stage = LeastSquares::new()
            .model_type(ModelType::SecondStage)
            .names(&self.response, &[fitted_name.as_str()])
            .fit(y, &[first_stage.fitted_values.view()])?;

        let b0 = second_stage.intercept();
        let b1 = second_stage.slope();
        let structural_residuals = y.mapv(|v| v - b0) - &x * b1;

        let df = second_stage.model_statistics.df_residual;
        let standard_errors = (df > 0).then(|| {
            let sigma2 = structural_residuals.dot(&structural_residuals) / df as f64;
            second_stage
                .unscaled_covariance
                .diag()
                .mapv(|v| (sigma2 * v).max(0.0).sqrt())
        });

        debug!(
            estimate = b1,
            first_stage_r_squared = first_stage.r_squared(),
            "two-stage least squares"
        );

        Ok(TwoStageResult {
            first_stage,
            second_stage,
            structural_residuals,
            standard_errors,
            endogenous_name: self.endogenous.clone(),
        })
    }
}

/// Convenience function: 2SLS of `y` on `x` instrumented by `z`
pub fn two_stage_least_squares(
    y: ArrayView1<'_, f64>,
    x: ArrayView1<'_, f64>,
    z: ArrayView1<'_, f64>,
) -> Result<TwoStageResult> {
    TwoStageLeastSquares::new().fit(y, x, z)
}
