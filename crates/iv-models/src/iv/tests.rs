//! Tests for 2SLS, instrument diagnostics and the LATE analyzer

use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};

use iv_core::{ComplianceType, SimulatedDataset, SimulationMode, TypeProportions};

use super::*;
use crate::base::{ModelError, ModelResultTrait, ModelType};
use crate::lm::ols;

fn hte_dataset(
    rows: &[(ComplianceType, f64)],
    proportions: TypeProportions,
) -> SimulatedDataset {
    let z: Array1<f64> = rows.iter().map(|&(_, z)| z).collect();
    let d: Array1<f64> = rows.iter().map(|&(kind, z)| kind.treatment(z)).collect();
    let y: Array1<f64> = rows
        .iter()
        .zip(d.iter())
        .map(|(&(kind, _), &d)| kind.true_effect() * d)
        .collect();
    let u = Array1::zeros(rows.len());
    let types = rows.iter().map(|&(kind, _)| kind).collect();

    SimulatedDataset::new(SimulationMode::Heterogeneous, u, z, d, y)
        .unwrap()
        .with_types(types, proportions, false)
        .unwrap()
}

fn both_arms(kinds: &[ComplianceType]) -> Vec<(ComplianceType, f64)> {
    [1.0, 0.0]
        .iter()
        .flat_map(|&z| kinds.iter().map(move |&kind| (kind, z)))
        .collect()
}

// ==================== Two-Stage Least Squares ====================

#[test]
fn test_tsls_recovers_exact_structural_slope() {
    // X has a part orthogonal to Z, Y is an exact linear function of X
    let z = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let x = array![0.3, 2.1, 3.8, 6.4, 7.9, 10.2];
    let y: Array1<f64> = &x * 3.0 + 1.0;

    let result = two_stage_least_squares(y.view(), x.view(), z.view()).unwrap();

    assert_abs_diff_eq!(result.estimate(), 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.intercept(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.structural_residuals.sum(), 0.0, epsilon = 1e-9);
    assert_eq!(result.first_stage.model_type, ModelType::FirstStage);
    assert_eq!(result.second_stage.model_type, ModelType::SecondStage);
}

#[test]
fn test_tsls_matches_covariance_ratio() {
    let z = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0];
    let x = array![0.2, 1.1, 0.4, 0.7, 1.5, -0.1, 0.9, 0.3];
    let y = array![1.0, 2.9, 0.8, 2.2, 3.1, 0.1, 2.4, 1.3];

    let result = two_stage_least_squares(y.view(), x.view(), z.view()).unwrap();
    let diagnostics =
        Diagnostics::first_stage(y.view(), x.view(), z.view(), &result.first_stage);

    let wald = diagnostics.wald_estimate.unwrap();
    assert_abs_diff_eq!(result.estimate(), wald, epsilon = 1e-9);
}

#[test]
fn test_tsls_standard_errors_use_structural_residuals() {
    let z = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0];
    let x = array![0.2, 1.1, 0.4, 0.7, 1.5, -0.1, 0.9, 0.3];
    let y = array![1.0, 2.9, 0.8, 2.2, 3.1, 0.1, 2.4, 1.3];

    let result = two_stage_least_squares(y.view(), x.view(), z.view()).unwrap();

    let b0 = result.intercept();
    let b1 = result.estimate();
    let expected: Array1<f64> = y.mapv(|v| v - b0) - &x * b1;
    assert_abs_diff_eq!(result.structural_residuals, expected, epsilon = 1e-12);

    // se(b1) = sqrt(σ² / Σ(X̂ − X̄)²) with σ² from the structural residuals
    let sigma2 = expected.dot(&expected) / 6.0;
    let fitted = result.fitted_treatment();
    let fitted_mean = fitted.mean().unwrap();
    let sxx: f64 = fitted.iter().map(|&v| (v - fitted_mean).powi(2)).sum();
    let se = result.standard_errors.as_ref().unwrap();
    assert_abs_diff_eq!(se[1], (sigma2 / sxx).sqrt(), epsilon = 1e-9);

    // second-stage OLS errors would use the projected residuals instead
    let naive = result.second_stage.standard_errors.as_ref().unwrap();
    assert!((naive[1] - se[1]).abs() > 1e-6);
}

#[test]
fn test_tsls_summary_names_the_endogenous_regressor() {
    let z = array![0.0, 1.0, 2.0, 3.0, 4.0];
    let x = array![0.1, 1.2, 1.9, 3.2, 3.9];
    let y = array![0.5, 2.0, 2.4, 4.1, 4.8];

    let result = TwoStageLeastSquares::new()
        .names("earnings", "served", "lottery")
        .fit(y.view(), x.view(), z.view())
        .unwrap();

    let summary = result.summary();
    assert_eq!(summary.model_type, ModelType::TwoStageLeastSquares);
    assert_eq!(summary.formula, "earnings ~ served (instrumented)");
    assert_eq!(summary.coefficients[1].name, "served");
    assert_eq!(result.second_stage.variable_names[1], "served_hat");
    assert!(result.to_string().contains("2SLS (IV) Regression"));
}

#[test]
fn test_tsls_dimension_mismatch() {
    let z = array![0.0, 1.0, 2.0];
    let x = array![0.0, 1.0];
    let y = array![0.0, 1.0, 2.0];

    let err = two_stage_least_squares(y.view(), x.view(), z.view()).unwrap_err();
    assert!(matches!(err, ModelError::DimensionMismatch { .. }));
}

// ==================== Diagnostics ====================

#[test]
fn test_f_statistic_matches_r_squared_identity() {
    let z = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let x = array![0.1, 0.9, 2.2, 2.8, 4.1, 5.3];

    let first_stage = ols(x.view(), z.view()).unwrap();
    let f = Diagnostics::f_statistic(x.view(), &first_stage);

    // One regressor: F = R² / (1 − R²) · (n − 2)
    let r2 = first_stage.r_squared();
    assert!(!f.degenerate);
    assert_abs_diff_eq!(f.value, r2 / (1.0 - r2) * 4.0, epsilon = 1e-6 * f.value);
    let p = f.p_value.unwrap();
    assert!(p < 1e-3, "p-value = {}", p);
}

#[test]
fn test_f_statistic_equals_squared_slope_t() {
    let z = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
    let x = array![0.3, 0.8, 0.1, 1.2, 0.4, 0.6, 0.9, -0.2, 0.7, 0.5];

    let first_stage = ols(x.view(), z.view()).unwrap();
    let f = Diagnostics::f_statistic(x.view(), &first_stage);

    let t = first_stage.coefficient_table()[1].t_stat.unwrap();
    assert_abs_diff_eq!(f.value, t * t, epsilon = 1e-9);
}

#[test]
fn test_f_statistic_perfect_first_stage_is_infinite() {
    let z = array![0.0, 1.0, 2.0, 3.0, 4.0];
    let x: Array1<f64> = &z * 2.0 + 1.0;

    let first_stage = ols(x.view(), z.view()).unwrap();
    let f = Diagnostics::f_statistic(x.view(), &first_stage);

    assert!(f.value.is_infinite());
    assert!(f.degenerate);
    assert!(f.p_value.is_none());
}

#[test]
fn test_f_statistic_needs_residual_degrees_of_freedom() {
    let z = array![0.0, 1.0];
    let x = array![0.5, 1.5];

    let first_stage = ols(x.view(), z.view()).unwrap();
    let f = Diagnostics::f_statistic(x.view(), &first_stage);

    assert!(f.value.is_infinite());
    assert!(f.degenerate);
}

#[test]
fn test_first_stage_flags_irrelevant_instrument() {
    // Z carries no information about X
    let z = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
    let x = array![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0];
    let y = array![2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5];

    let tsls = two_stage_least_squares(y.view(), x.view(), z.view()).unwrap();
    let diagnostics =
        Diagnostics::first_stage(y.view(), x.view(), z.view(), &tsls.first_stage);

    assert!(diagnostics.weak_instrument);
    assert!(!diagnostics.passes_stock_yogo_10);
    assert!(diagnostics.f_statistic.value < WEAK_INSTRUMENT_THRESHOLD);
    assert_abs_diff_eq!(diagnostics.covariance, 0.0, epsilon = 1e-12);
    assert!(diagnostics.wald_estimate.is_none());
}

#[test]
fn test_first_stage_association_measures() {
    let z = array![0.0, 1.0, 2.0, 3.0];
    let x = array![1.0, 3.0, 5.0, 7.0];
    let y = array![0.0, 1.0, 0.0, 1.0];

    let first_stage = ols(x.view(), z.view()).unwrap();
    let diagnostics = Diagnostics::first_stage(y.view(), x.view(), z.view(), &first_stage);

    assert_abs_diff_eq!(diagnostics.correlation, 1.0, epsilon = 1e-12);
    // cov(X, Z) = 2 · var(Z) = 2 · 5/3
    assert_abs_diff_eq!(diagnostics.covariance, 10.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(diagnostics.r_squared, 1.0, epsilon = 1e-12);
    assert!(!diagnostics.weak_instrument);
    assert!(diagnostics.passes_stock_yogo_10);
}

#[test]
fn test_wald_estimate_absent_for_constant_treatment() {
    let z = array![0.0, 1.0, 0.0, 1.0];
    let x = array![1.0, 1.0, 1.0, 1.0];
    let y = array![0.3, 0.7, 0.2, 0.9];

    let first_stage = ols(x.view(), z.view()).unwrap();
    let diagnostics = Diagnostics::first_stage(y.view(), x.view(), z.view(), &first_stage);

    assert!(diagnostics.wald_estimate.is_none());
    assert_eq!(diagnostics.correlation, 0.0);
}

#[test]
fn test_bias_metrics() {
    let z = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0];
    let x = array![0.2, 1.1, 0.4, 0.7, 1.5, -0.1, 0.9, 0.3];
    let y = array![1.0, 2.9, 0.8, 2.2, 3.1, 0.1, 2.4, 1.3];

    let ols_fit = ols(y.view(), x.view()).unwrap();
    let tsls = two_stage_least_squares(y.view(), x.view(), z.view()).unwrap();
    let bias = Diagnostics::bias(2.0, &ols_fit, &tsls);

    assert_abs_diff_eq!(bias.ols_bias, ols_fit.slope() - 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(bias.tsls_bias, tsls.estimate() - 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
        bias.tsls_bias_pct.unwrap(),
        bias.tsls_bias / 2.0 * 100.0,
        epsilon = 1e-12
    );
    assert_eq!(bias.tsls_is_closer(), bias.tsls_bias.abs() < bias.ols_bias.abs());

    let unscaled = Diagnostics::bias(0.0, &ols_fit, &tsls);
    assert!(unscaled.ols_bias_pct.is_none());
    assert!(unscaled.tsls_bias_pct.is_none());
}

// ==================== LATE ====================

#[test]
fn test_late_without_defiers_is_complier_effect() {
    use ComplianceType::*;
    let rows = both_arms(&[Complier, Complier, AlwaysTaker, NeverTaker]);
    let dataset = hte_dataset(&rows, TypeProportions::new(0.5, 0.25, 0.25, 0.0));

    let late = LateAnalyzer::analyze(&dataset).unwrap();

    assert_eq!(late.theoretical_late, 5.0);
    assert!(!late.monotonicity_violated);
    assert!(!late.wald.degenerate);
    assert_abs_diff_eq!(late.wald.ratio, 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(late.population_wald_ratio, 5.0, epsilon = 1e-12);
    // 0.5·5 + 0.25·2 + 0.25·2
    assert_abs_diff_eq!(late.population_ate, 3.5, epsilon = 1e-12);
}

#[test]
fn test_late_with_defiers_uses_wald_ratio() {
    use ComplianceType::*;
    let rows = both_arms(&[Complier, Complier, AlwaysTaker, NeverTaker, Defier]);
    let dataset = hte_dataset(&rows, TypeProportions::new(0.4, 0.2, 0.2, 0.2));

    let late = LateAnalyzer::analyze(&dataset).unwrap();

    // (2.4 − 0.8) / (0.6 − 0.4)
    assert!(late.monotonicity_violated);
    assert_abs_diff_eq!(late.wald.reduced_form, 1.6, epsilon = 1e-12);
    assert_abs_diff_eq!(late.wald.first_stage, 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(late.theoretical_late, 8.0, epsilon = 1e-9);
    // (0.4·5 − 0.2·2) / (0.4 − 0.2)
    assert_abs_diff_eq!(late.population_wald_ratio, 8.0, epsilon = 1e-9);
    assert_abs_diff_eq!(late.population_ate, 3.2, epsilon = 1e-12);
    assert!(!late.is_degenerate());
}

#[test]
fn test_late_contributions_per_type() {
    use ComplianceType::*;
    let rows = both_arms(&[Complier, Complier, AlwaysTaker, NeverTaker, Defier]);
    let dataset = hte_dataset(&rows, TypeProportions::new(0.4, 0.2, 0.2, 0.2));

    let late = LateAnalyzer::analyze(&dataset).unwrap();

    assert_eq!(late.contributions.len(), 4);
    let compliers = late.contribution(Complier).unwrap();
    assert_eq!(compliers.sample_count, 4);
    assert_eq!(compliers.true_effect, 5.0);
    assert_abs_diff_eq!(compliers.weighted_contribution, 2.0, epsilon = 1e-12);

    let defiers = late.contribution(Defier).unwrap();
    assert_eq!(defiers.sample_count, 2);
    assert_abs_diff_eq!(defiers.weighted_contribution, 0.4, epsilon = 1e-12);

    let total: f64 = late.contributions.iter().map(|c| c.weighted_contribution).sum();
    assert_abs_diff_eq!(total, late.population_ate, epsilon = 1e-12);
}

#[test]
fn test_late_degenerate_first_stage() {
    use ComplianceType::*;
    // Compliers and defiers cancel: E[D|Z=1] = E[D|Z=0]
    let rows = both_arms(&[Complier, Defier]);
    let dataset = hte_dataset(&rows, TypeProportions::new(0.5, 0.0, 0.0, 0.5));

    let late = LateAnalyzer::analyze(&dataset).unwrap();

    assert!(late.wald.degenerate);
    assert_eq!(late.theoretical_late, 0.0);
    assert_eq!(late.population_wald_ratio, 0.0);
    assert!(late.is_degenerate());
}

#[test]
fn test_wald_estimate_empty_arm() {
    let z = array![1.0, 1.0, 1.0];
    let d = array![1.0, 0.0, 1.0];
    let y = array![5.0, 0.0, 5.0];

    let wald = WaldEstimate::from_sample(y.view(), d.view(), z.view());
    assert!(wald.degenerate);
    assert_eq!(wald.ratio, 0.0);
}

#[test]
fn test_late_requires_compliance_types() {
    let column = array![0.0, 1.0, 0.0, 1.0];
    let dataset = SimulatedDataset::new(
        SimulationMode::Continuous,
        column.clone(),
        column.clone(),
        column.clone(),
        column,
    )
    .unwrap();

    let err = LateAnalyzer::analyze(&dataset).unwrap_err();
    assert!(matches!(err, ModelError::InvalidInput { .. }));
}
