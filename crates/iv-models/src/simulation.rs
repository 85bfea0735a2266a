//! One simulation run, end to end
//!
//! [`run_simulation`] draws a dataset from a configuration, fits OLS and
//! 2SLS on it, runs the instrument diagnostics and, for the
//! heterogeneous-effects model, the LATE analysis. Numerical degeneracies
//! never abort a run; they are reported as [`SimulationWarning`]s next to
//! the sentinel values they produced.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use iv_core::{CoreError, SimulatedDataset, SimulationConfig, StructuralSimulator, TRUE_EFFECT};

use crate::base::{ModelResultTrait, ModelType, Result};
use crate::iv::{
    DiagnosticResults, Diagnostics, LateAnalysis, LateAnalyzer, TwoStageLeastSquares,
    TwoStageResult,
};
use crate::lm::{LeastSquares, RegressionResult};


/// Recoverable condition detected during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationWarning {
    /// First-stage F below the rule-of-thumb threshold
    WeakInstrument { f_statistic: f64 },
    /// First-stage residual variance vanished; F is reported as infinite
    FStatisticDegenerate,
    /// Wald denominator vanished; the LATE is reported as zero
    LateDenominatorDegenerate { first_stage_difference: f64 },
    /// Defiers present, so 2SLS no longer identifies the complier effect
    MonotonicityViolation { defier_share: f64 },
    /// The instrument affects the outcome directly
    ExclusionViolation { direct_effect: f64 },
    /// A regression fell back to the minimum-norm solution
    RankDeficientDesign { regression: ModelType, rank: usize },
    /// All compliance shares were zero and the default split was used
    ProportionFallback,
}

impl fmt::Display for SimulationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationWarning::WeakInstrument { f_statistic } => write!(
                f,
                "weak instrument: first-stage F = {:.2} is below 10",
                f_statistic
            ),
            SimulationWarning::FStatisticDegenerate => {
                write!(f, "first stage fits perfectly, F reported as infinite")
            }
            SimulationWarning::LateDenominatorDegenerate {
                first_stage_difference,
            } => write!(
                f,
                "E[D|Z=1] - E[D|Z=0] = {:.2e}, LATE reported as 0",
                first_stage_difference
            ),
            SimulationWarning::MonotonicityViolation { defier_share } => write!(
                f,
                "monotonicity violated: {:.1}% defiers",
                defier_share * 100.0
            ),
            SimulationWarning::ExclusionViolation { direct_effect } => write!(
                f,
                "exclusion restriction violated: Z enters Y with coefficient {}",
                direct_effect
            ),
            SimulationWarning::RankDeficientDesign { regression, rank } => {
                write!(f, "{} design has rank {}", regression, rank)
            }
            SimulationWarning::ProportionFallback => write!(
                f,
                "all compliance shares were zero, default proportions used"
            ),
        }
    }
}

/// Everything produced by one run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    /// Configuration the run was drawn from
    pub config: SimulationConfig,
    /// Simulated data
    pub dataset: SimulatedDataset,
    /// Outcome regressed directly on treatment
    pub ols: RegressionResult,
    /// Both 2SLS stages
    pub tsls: TwoStageResult,
    /// Instrument diagnostics and bias metrics
    pub diagnostics: DiagnosticResults,
    /// LATE analysis, heterogeneous-effects model only
    pub late: Option<LateAnalysis>,
    /// Degeneracies and assumption violations met along the way
    pub warnings: Vec<SimulationWarning>,
}

impl SimulationOutcome {
    /// Treatment regressed on the instrument
    pub fn first_stage(&self) -> &RegressionResult {
        &self.tsls.first_stage
    }

    /// Outcome regressed on the fitted treatment
    pub fn second_stage(&self) -> &RegressionResult {
        &self.tsls.second_stage
    }

    /// Whether a warning matching `predicate` was raised
    pub fn has_warning(&self, predicate: impl Fn(&SimulationWarning) -> bool) -> bool {
        self.warnings.iter().any(predicate)
    }

    /// OLS and 2SLS side by side, followed by the diagnostics
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// Serialize the whole outcome; infinite F-statistics become `null`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(CoreError::from)?)
    }
}

impl fmt::Display for SimulationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulation: {:?}, n = {}, seed = {}",
            self.config.mode, self.config.n, self.config.seed
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.ols.summary())?;
        writeln!(f, "{}", self.tsls.summary())?;

        let first_stage = &self.diagnostics.first_stage;
        writeln!(f, "Diagnostics")?;
        writeln!(f, "===========")?;
        writeln!(f, "  First-stage F: {:.4}", first_stage.f_statistic.value)?;
        if let Some(p) = first_stage.f_statistic.p_value {
            writeln!(f, "  First-stage F p-value: {:.4e}", p)?;
        }
        writeln!(f, "  Corr(X, Z): {:.4}", first_stage.correlation)?;
        writeln!(f, "  Cov(X, Z): {:.4}", first_stage.covariance)?;
        match first_stage.wald_estimate {
            Some(wald) => writeln!(f, "  Wald ratio Cov(Y, Z) / Cov(X, Z): {:.4}", wald)?,
            None => writeln!(f, "  Wald ratio Cov(Y, Z) / Cov(X, Z): undefined")?,
        }

        let bias = &self.diagnostics.bias;
        writeln!(f, "  Reference effect: {:.4}", bias.reference)?;
        writeln!(f, "  OLS bias: {:+.4}", bias.ols_bias)?;
        writeln!(f, "  2SLS bias: {:+.4}", bias.tsls_bias)?;

        if let Some(late) = &self.late {
            writeln!(f)?;
            writeln!(f, "LATE")?;
            writeln!(f, "====")?;
            writeln!(f, "  Population ATE: {:.4}", late.population_ate)?;
            writeln!(f, "  Theoretical LATE: {:.4}", late.theoretical_late)?;
            for c in &late.contributions {
                writeln!(
                    f,
                    "  {:<14} share {:.3}  effect {:.1}  weighted {:.3}  n = {}",
                    c.compliance_type.label(),
                    c.proportion,
                    c.true_effect,
                    c.weighted_contribution,
                    c.sample_count
                )?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings")?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }

        Ok(())
    }
}

/// Draw a dataset and run every estimator and diagnostic on it
///
/// Invalid configurations fail before any random draw. Same configuration
/// and seed give the same outcome.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationOutcome> {
    let dataset = StructuralSimulator::new(config)?.simulate()?;

    let label = dataset.treatment_label();
    let y = dataset.outcome().view();
    let x = dataset.treatment().view();
    let z = dataset.instrument().view();

    let ols = LeastSquares::new()
        .model_type(ModelType::Ols)
        .names("Y", &[label])
        .fit(y, &[x])?;
    let tsls = TwoStageLeastSquares::new().names("Y", label, "Z").fit(y, x, z)?;

    let late = if config.mode.is_heterogeneous() {
        Some(LateAnalyzer::analyze(&dataset)?)
    } else {
        None
    };
    let reference = late.as_ref().map_or(TRUE_EFFECT, |l| l.theoretical_late);
    let diagnostics = Diagnostics::run_all(y, x, z, &ols, &tsls, reference);

    let warnings = collect_warnings(config, &dataset, &ols, &tsls, &diagnostics, late.as_ref());
    for warning in &warnings {
        warn!(%warning, "simulation warning");
    }

    debug!(
        ols = ols.slope(),
        tsls = tsls.estimate(),
        f_statistic = diagnostics.first_stage.f_statistic.value,
        warnings = warnings.len(),
        "simulation complete"
    );

    Ok(SimulationOutcome {
        config: config.clone(),
        dataset,
        ols,
        tsls,
        diagnostics,
        late,
        warnings,
    })
}

fn collect_warnings(
    config: &SimulationConfig,
    dataset: &SimulatedDataset,
    ols: &RegressionResult,
    tsls: &TwoStageResult,
    diagnostics: &DiagnosticResults,
    late: Option<&LateAnalysis>,
) -> Vec<SimulationWarning> {
    let mut warnings = Vec::new();

    let f_statistic = diagnostics.first_stage.f_statistic;
    if f_statistic.degenerate {
        warnings.push(SimulationWarning::FStatisticDegenerate);
    } else if diagnostics.first_stage.weak_instrument {
        warnings.push(SimulationWarning::WeakInstrument {
            f_statistic: f_statistic.value,
        });
    }

    for regression in [ols, &tsls.first_stage, &tsls.second_stage] {
        if regression.is_rank_deficient() {
            warnings.push(SimulationWarning::RankDeficientDesign {
                regression: regression.model_type.clone(),
                rank: regression.rank(),
            });
        }
    }

    // The heterogeneous outcome equation has no direct instrument effect
    if !config.mode.is_heterogeneous() && config.exclusion_violation != 0.0 {
        warnings.push(SimulationWarning::ExclusionViolation {
            direct_effect: config.exclusion_violation,
        });
    }

    if let Some(late) = late {
        if late.monotonicity_violated {
            let defier_share = dataset.proportions().map_or(0.0, |p| p.defier);
            warnings.push(SimulationWarning::MonotonicityViolation { defier_share });
        }
        if late.is_degenerate() {
            warnings.push(SimulationWarning::LateDenominatorDegenerate {
                first_stage_difference: late.wald.first_stage,
            });
        }
    }

    if dataset.used_proportion_fallback() {
        warnings.push(SimulationWarning::ProportionFallback);
    }

    warnings
}
