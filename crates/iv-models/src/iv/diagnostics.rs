//! Instrument diagnostics
//!
//! This module provides the first-stage F-statistic, the association
//! between treatment and instrument, and the bias of OLS and 2SLS against
//! a known reference effect.

use ndarray::ArrayView1;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::warn;

use iv_core::data::stats;

use crate::base::ModelResultTrait;
use crate::iv::TwoStageResult;
use crate::lm::RegressionResult;

/// Staiger–Stock rule of thumb: F below this flags a weak instrument
pub const WEAK_INSTRUMENT_THRESHOLD: f64 = 10.0;

/// Stock–Yogo 10% maximal IV size critical value for one instrument
pub const STOCK_YOGO_10PCT: f64 = 16.38;

/// Scaled F denominators below this are treated as zero
const F_DENOMINATOR_TOLERANCE: f64 = 1e-10;

/// References smaller than this have no meaningful percentage bias
const REFERENCE_TOLERANCE: f64 = 1e-12;

/// First-stage F-statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FStatistic {
    /// `F = (Σ(X̂ − X̄)² / 1) / (Σ(X − X̂)² / (n − 2))`, `+∞` when degenerate
    pub value: f64,
    /// Upper-tail probability under `F(1, n − 2)`
    pub p_value: Option<f64>,
    /// The denominator vanished and `value` is the `+∞` sentinel
    pub degenerate: bool,
}

/// Strength and association diagnostics of the first stage
#[derive(Debug, Clone, Serialize)]
pub struct FirstStageDiagnostics {
    /// First-stage F-statistic
    pub f_statistic: FStatistic,
    /// First-stage R²
    pub r_squared: f64,
    /// Pearson correlation between treatment and instrument
    pub correlation: f64,
    /// Sample covariance between treatment and instrument
    pub covariance: f64,
    /// Wald ratio `Cov(Y, Z) / Cov(X, Z)`; `None` if `Cov(X, Z)` vanishes
    pub wald_estimate: Option<f64>,
    /// `F < 10`
    pub weak_instrument: bool,
    /// `F > 16.38`
    pub passes_stock_yogo_10: bool,
}

/// Deviation of the estimates from the reference effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiasMetrics {
    /// Effect the estimators are compared against
    pub reference: f64,
    /// OLS slope
    pub ols_estimate: f64,
    /// 2SLS estimate
    pub tsls_estimate: f64,
    /// `β̂_OLS − reference`
    pub ols_bias: f64,
    /// `β̂_2SLS − reference`
    pub tsls_bias: f64,
    /// OLS bias in percent of the reference
    pub ols_bias_pct: Option<f64>,
    /// 2SLS bias in percent of the reference
    pub tsls_bias_pct: Option<f64>,
}

impl BiasMetrics {
    /// Whether 2SLS lands closer to the reference than OLS
    pub fn tsls_is_closer(&self) -> bool {
        self.tsls_bias.abs() < self.ols_bias.abs()
    }
}

/// Diagnostic results of one run
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticResults {
    /// First-stage diagnostics
    pub first_stage: FirstStageDiagnostics,
    /// Bias of OLS and 2SLS
    pub bias: BiasMetrics,
}

/// Diagnostic analyzer
pub struct Diagnostics;

impl Diagnostics {
    /// Compute the first-stage F-statistic from the stage-1 regression
    pub fn f_statistic(
        treatment: ArrayView1<'_, f64>,
        first_stage: &RegressionResult,
    ) -> FStatistic {
        let n = treatment.len();
        let fitted = &first_stage.fitted_values;
        let x_mean = stats::mean(treatment);

        let explained: f64 = fitted.iter().map(|&f| (f - x_mean).powi(2)).sum();
        let ssr: f64 = treatment
            .iter()
            .zip(fitted.iter())
            .map(|(&x, &f)| (x - f).powi(2))
            .sum();

        if n <= 2 {
            warn!(n, "first-stage F undefined without residual degrees of freedom");
            return FStatistic {
                value: f64::INFINITY,
                p_value: None,
                degenerate: true,
            };
        }

        let df_residual = (n - 2) as f64;
        let denominator = ssr / df_residual;
        let scale = (stats::total_sum_of_squares(treatment) / n as f64).max(1.0);
        if denominator / scale < F_DENOMINATOR_TOLERANCE {
            warn!(denominator, "first-stage residual variance vanished, reporting F = inf");
            return FStatistic {
                value: f64::INFINITY,
                p_value: None,
                degenerate: true,
            };
        }

        let value = explained / denominator;
        let p_value = FisherSnedecor::new(1.0, df_residual)
            .ok()
            .map(|dist| (1.0 - dist.cdf(value)).clamp(0.0, 1.0));

        FStatistic {
            value,
            p_value,
            degenerate: false,
        }
    }

    /// Strength and association diagnostics
    pub fn first_stage(
        outcome: ArrayView1<'_, f64>,
        treatment: ArrayView1<'_, f64>,
        instrument: ArrayView1<'_, f64>,
        first_stage: &RegressionResult,
    ) -> FirstStageDiagnostics {
        let f_statistic = Self::f_statistic(treatment, first_stage);
        let covariance = stats::sample_covariance(treatment, instrument);
        let wald_estimate = (covariance.abs() > REFERENCE_TOLERANCE)
            .then(|| stats::sample_covariance(outcome, instrument) / covariance);

        FirstStageDiagnostics {
            f_statistic,
            r_squared: first_stage.r_squared(),
            correlation: stats::pearson_correlation(treatment, instrument),
            covariance,
            wald_estimate,
            weak_instrument: f_statistic.value < WEAK_INSTRUMENT_THRESHOLD,
            passes_stock_yogo_10: f_statistic.value > STOCK_YOGO_10PCT,
        }
    }

    /// Bias of the OLS and 2SLS estimates against `reference`
    pub fn bias(reference: f64, ols: &RegressionResult, tsls: &TwoStageResult) -> BiasMetrics {
        let ols_estimate = ols.slope();
        let tsls_estimate = tsls.estimate();
        let ols_bias = ols_estimate - reference;
        let tsls_bias = tsls_estimate - reference;
        let pct = |bias: f64| {
            (reference.abs() > REFERENCE_TOLERANCE).then(|| bias / reference * 100.0)
        };

        BiasMetrics {
            reference,
            ols_estimate,
            tsls_estimate,
            ols_bias,
            tsls_bias,
            ols_bias_pct: pct(ols_bias),
            tsls_bias_pct: pct(tsls_bias),
        }
    }

    /// Run all diagnostics
    pub fn run_all(
        outcome: ArrayView1<'_, f64>,
        treatment: ArrayView1<'_, f64>,
        instrument: ArrayView1<'_, f64>,
        ols: &RegressionResult,
        tsls: &TwoStageResult,
        reference: f64,
    ) -> DiagnosticResults {
        DiagnosticResults {
            first_stage: Self::first_stage(outcome, treatment, instrument, &tsls.first_stage),
            bias: Self::bias(reference, ols, tsls),
        }
    }
}
