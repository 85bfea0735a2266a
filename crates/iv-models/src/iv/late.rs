//! Local Average Treatment Effect (LATE) analysis
//!
//! With heterogeneous effects, IV recovers the average effect among
//! compliers only, and only if no unit defies the instrument. The analyzer
//! compares the population average effect with the complier effect and
//! reports how each compliance type contributes.

use ndarray::ArrayView1;
use serde::Serialize;
use tracing::{debug, warn};

use iv_core::{ComplianceType, SimulatedDataset};
use iv_core::data::stats;

use crate::base::Result;
use crate::error::ModelError;

/// First-stage differences below this make the Wald ratio undefined
pub const LATE_DENOMINATOR_TOLERANCE: f64 = 1e-6;

/// Sample Wald ratio of a binary instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaldEstimate {
    /// `E[Y|Z=1] − E[Y|Z=0]`
    pub reduced_form: f64,
    /// `E[D|Z=1] − E[D|Z=0]`
    pub first_stage: f64,
    /// `reduced_form / first_stage`, `0.0` when degenerate
    pub ratio: f64,
    /// An instrument arm was empty or the first-stage difference vanished
    pub degenerate: bool,
}

impl WaldEstimate {
    /// Compute the Wald ratio from outcome, treatment and binary instrument
    pub fn from_sample(
        outcome: ArrayView1<'_, f64>,
        treatment: ArrayView1<'_, f64>,
        instrument: ArrayView1<'_, f64>,
    ) -> Self {
        let arms = (
            stats::arm_mean(outcome, instrument, true),
            stats::arm_mean(outcome, instrument, false),
            stats::arm_mean(treatment, instrument, true),
            stats::arm_mean(treatment, instrument, false),
        );

        let (Some(y1), Some(y0), Some(d1), Some(d0)) = arms else {
            return Self {
                reduced_form: 0.0,
                first_stage: 0.0,
                ratio: 0.0,
                degenerate: true,
            };
        };

        let reduced_form = y1 - y0;
        let first_stage = d1 - d0;
        if first_stage.abs() < LATE_DENOMINATOR_TOLERANCE {
            return Self {
                reduced_form,
                first_stage,
                ratio: 0.0,
                degenerate: true,
            };
        }

        Self {
            reduced_form,
            first_stage,
            ratio: reduced_form / first_stage,
            degenerate: false,
        }
    }
}

/// Share and effect of one compliance type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TypeContribution {
    /// Compliance type
    pub compliance_type: ComplianceType,
    /// Population share
    pub proportion: f64,
    /// True effect of the type
    pub true_effect: f64,
    /// `proportion × true_effect`
    pub weighted_contribution: f64,
    /// Units of this type in the sample
    pub sample_count: usize,
}

/// LATE analysis of one heterogeneous-effects dataset
#[derive(Debug, Clone, Serialize)]
pub struct LateAnalysis {
    /// `Σ p_t β_t`
    pub population_ate: f64,
    /// Complier effect when no defiers exist, the sample Wald ratio otherwise
    pub theoretical_late: f64,
    /// Sample Wald ratio
    pub wald: WaldEstimate,
    /// `(p_C β_C − p_D β_D) / (p_C − p_D)`, limit of the Wald ratio
    pub population_wald_ratio: f64,
    /// Defiers are present
    pub monotonicity_violated: bool,
    /// Per-type breakdown in [`ComplianceType::ALL`] order
    pub contributions: Vec<TypeContribution>,
}

impl LateAnalysis {
    /// Contribution of one type
    pub fn contribution(&self, kind: ComplianceType) -> Option<&TypeContribution> {
        self.contributions.iter().find(|c| c.compliance_type == kind)
    }

    /// Whether the theoretical LATE fell back to the `0.0` sentinel
    pub fn is_degenerate(&self) -> bool {
        self.monotonicity_violated && self.wald.degenerate
    }
}

/// LATE analyzer
pub struct LateAnalyzer;

impl LateAnalyzer {
    /// Analyze a dataset drawn from the heterogeneous-effects model
    pub fn analyze(dataset: &SimulatedDataset) -> Result<LateAnalysis> {
        let (Some(proportions), Some(counts)) = (dataset.proportions(), dataset.type_counts())
        else {
            return Err(ModelError::InvalidInput {
                message: format!(
                    "LATE analysis needs compliance types, dataset mode is {:?}",
                    dataset.mode()
                ),
            });
        };

        let contributions: Vec<TypeContribution> = ComplianceType::ALL
            .iter()
            .map(|&kind| {
                let proportion = proportions.get(kind);
                let true_effect = kind.true_effect();
                TypeContribution {
                    compliance_type: kind,
                    proportion,
                    true_effect,
                    weighted_contribution: proportion * true_effect,
                    sample_count: counts[kind.index()],
                }
            })
            .collect();
        let population_ate: f64 = contributions.iter().map(|c| c.weighted_contribution).sum();

        let wald = WaldEstimate::from_sample(
            dataset.outcome().view(),
            dataset.treatment().view(),
            dataset.instrument().view(),
        );

        let monotonicity_violated = proportions.has_defiers();
        let theoretical_late = if monotonicity_violated {
            if wald.degenerate {
                warn!(
                    first_stage = wald.first_stage,
                    "Wald denominator vanished, reporting LATE = 0"
                );
            }
            wald.ratio
        } else {
            ComplianceType::Complier.true_effect()
        };

        let p_c = proportions.complier;
        let p_d = proportions.defier;
        let denominator = p_c - p_d;
        let population_wald_ratio = if denominator.abs() < LATE_DENOMINATOR_TOLERANCE {
            0.0
        } else {
            (p_c * ComplianceType::Complier.true_effect()
                - p_d * ComplianceType::Defier.true_effect())
                / denominator
        };

        debug!(
            population_ate,
            theoretical_late,
            monotonicity_violated,
            "LATE analysis"
        );

        Ok(LateAnalysis {
            population_ate,
            theoretical_late,
            wald,
            population_wald_ratio,
            monotonicity_violated,
            contributions,
        })
    }
}
