//! Simulation configuration
//!
//! A [`SimulationConfig`] is the complete, immutable parameter set of one
//! simulation run. Every run is a pure function of this value, so two runs
//! with the same config (seed included) produce identical datasets.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::data::ComplianceType;
use crate::error::{CoreError, Result};

/// True treatment effect β of the basic structural model
pub const TRUE_EFFECT: f64 = 1.0;

/// Effect α of the unobserved confounder U on the outcome
pub const CONFOUNDER_EFFECT: f64 = 1.0;

/// Admissible compliance rates in draft-lottery mode
pub const COMPLIANCE_RATE_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// Which structural model generates the data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Continuous treatment: `X = γZ + δU + e1`
    #[default]
    Continuous,
    /// Binary treatment from a thresholded draft lottery with non-compliers
    DraftLottery,
    /// Four latent compliance types with heterogeneous treatment effects
    Heterogeneous,
}

impl SimulationMode {
    /// Whether the run uses the compliance-type model
    pub fn is_heterogeneous(self) -> bool {
        matches!(self, SimulationMode::Heterogeneous)
    }
}

/// Distribution of the instrument Z
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentDistribution {
    /// `Z ~ Normal(0, 1)`
    #[default]
    Normal,
    /// `Z ~ Bernoulli(0.5)`, coded as 0.0 / 1.0
    Bernoulli,
}

/// Population shares of the four compliance types
///
/// Values are raw user input until passed through
/// [`TypeProportions::renormalized`]; they need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeProportions {
    pub complier: f64,
    pub always_taker: f64,
    pub never_taker: f64,
    pub defier: f64,
}

/// Outcome of renormalizing a set of proportions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renormalized {
    /// Proportions summing to one
    pub proportions: TypeProportions,
    /// True when every input was zero and the default split was used
    pub used_fallback: bool,
}

impl TypeProportions {
    /// Split used when no proportions are given, or all of them are zero
    pub const DEFAULT: TypeProportions = TypeProportions {
        complier: 0.4,
        always_taker: 0.3,
        never_taker: 0.3,
        defier: 0.0,
    };

    /// Create proportions from raw shares
    pub fn new(complier: f64, always_taker: f64, never_taker: f64, defier: f64) -> Self {
        Self {
            complier,
            always_taker,
            never_taker,
            defier,
        }
    }

    /// Create proportions from slider percentages in `0..=100`
    pub fn from_percentages(
        complier: f64,
        always_taker: f64,
        never_taker: f64,
        defier: f64,
    ) -> Self {
        Self::new(
            complier / 100.0,
            always_taker / 100.0,
            never_taker / 100.0,
            defier / 100.0,
        )
    }

    /// Share of one compliance type
    pub fn get(&self, kind: ComplianceType) -> f64 {
        match kind {
            ComplianceType::Complier => self.complier,
            ComplianceType::AlwaysTaker => self.always_taker,
            ComplianceType::NeverTaker => self.never_taker,
            ComplianceType::Defier => self.defier,
        }
    }

    /// Shares in [`ComplianceType::ALL`] order
    pub fn as_weights(&self) -> [f64; 4] {
        ComplianceType::ALL.map(|kind| self.get(kind))
    }

    /// Sum of the four shares
    pub fn total(&self) -> f64 {
        self.as_weights().iter().sum()
    }

    /// Whether any defiers are present
    pub fn has_defiers(&self) -> bool {
        self.defier > 0.0
    }

    /// Check that every share is finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for kind in ComplianceType::ALL {
            let share = self.get(kind);
            if !share.is_finite() || share < 0.0 {
                return Err(CoreError::config(format!(
                    "proportion for {} must be finite and non-negative, got {}",
                    kind, share
                )));
            }
        }
        Ok(())
    }

    /// Rescale the shares so that they sum to one
    ///
    /// An all-zero input falls back to [`TypeProportions::DEFAULT`]. Shares
    /// are scaled by the largest one first, so huge finite inputs cannot
    /// overflow the total.
    pub fn renormalized(&self) -> Result<Renormalized> {
        self.validate()?;

        let largest = self.as_weights().into_iter().fold(0.0, f64::max);
        if largest == 0.0 {
            return Ok(Renormalized {
                proportions: Self::DEFAULT,
                used_fallback: true,
            });
        }

        let [c, a, n, d] = self.as_weights().map(|w| w / largest);
        let total = c + a + n + d;
        Ok(Renormalized {
            proportions: Self::new(c / total, a / total, n / total, d / total),
            used_fallback: false,
        })
    }
}

impl Default for TypeProportions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parameter set for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of observations
    pub n: usize,
    /// Seed of the random number generator
    pub seed: u64,
    /// Structural model
    pub mode: SimulationMode,
    /// Instrument distribution in continuous mode
    pub instrument: InstrumentDistribution,
    /// Instrument strength γ (compliance rate in draft-lottery mode)
    pub instrument_strength: f64,
    /// Error transmission δ from the confounder into the treatment
    pub error_transmission: f64,
    /// Exclusion violation φ, the direct effect of Z on Y
    pub exclusion_violation: f64,
    /// Compliance-type shares in heterogeneous mode
    pub proportions: TypeProportions,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n: 1000,
            seed: 42,
            mode: SimulationMode::Continuous,
            instrument: InstrumentDistribution::Normal,
            instrument_strength: 1.0,
            error_transmission: 0.5,
            exclusion_violation: 0.0,
            proportions: TypeProportions::DEFAULT,
        }
    }
}

impl SimulationConfig {
    /// Continuous-treatment model with a Gaussian instrument
    pub fn continuous() -> Self {
        Self::default()
    }

    /// Draft-lottery model with the given compliance rate
    pub fn draft_lottery(compliance_rate: f64) -> Self {
        Self {
            mode: SimulationMode::DraftLottery,
            instrument: InstrumentDistribution::Bernoulli,
            instrument_strength: compliance_rate,
            ..Self::default()
        }
    }

    /// Heterogeneous-effects model where monotonicity holds
    pub fn hte_no_defiers() -> Self {
        Self {
            mode: SimulationMode::Heterogeneous,
            instrument: InstrumentDistribution::Bernoulli,
            proportions: TypeProportions::DEFAULT,
            ..Self::default()
        }
    }

    /// Heterogeneous-effects model with a defier subpopulation
    pub fn hte_with_defiers() -> Self {
        Self {
            proportions: TypeProportions::new(0.4, 0.2, 0.2, 0.2),
            ..Self::hte_no_defiers()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of observations
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the structural model
    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the instrument distribution used in continuous mode
    pub fn with_instrument(mut self, instrument: InstrumentDistribution) -> Self {
        self.instrument = instrument;
        self
    }

    /// Set γ
    pub fn with_instrument_strength(mut self, gamma: f64) -> Self {
        self.instrument_strength = gamma;
        self
    }

    /// Set δ
    pub fn with_error_transmission(mut self, delta: f64) -> Self {
        self.error_transmission = delta;
        self
    }

    /// Set φ
    pub fn with_exclusion_violation(mut self, phi: f64) -> Self {
        self.exclusion_violation = phi;
        self
    }

    /// Set the compliance-type shares
    pub fn with_proportions(mut self, proportions: TypeProportions) -> Self {
        self.proportions = proportions;
        self
    }

    /// Instrument distribution actually drawn for this mode
    ///
    /// Draft-lottery and heterogeneous runs need a binary instrument.
    pub fn effective_instrument(&self) -> InstrumentDistribution {
        match self.mode {
            SimulationMode::Continuous => self.instrument,
            SimulationMode::DraftLottery | SimulationMode::Heterogeneous => {
                InstrumentDistribution::Bernoulli
            }
        }
    }

    /// Check the configuration before any draw is made
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(CoreError::config("sample size n must be positive"));
        }

        let coefficients = [
            ("instrument_strength", self.instrument_strength),
            ("error_transmission", self.error_transmission),
            ("exclusion_violation", self.exclusion_violation),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() {
                return Err(CoreError::config(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        if self.mode == SimulationMode::DraftLottery
            && !COMPLIANCE_RATE_RANGE.contains(&self.instrument_strength)
        {
            return Err(CoreError::config(format!(
                "compliance rate must lie in [0, 1], got {}",
                self.instrument_strength
            )));
        }

        if self.mode.is_heterogeneous() {
            self.proportions.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.n, 1000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.mode, SimulationMode::Continuous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_renormalize_arbitrary_total() {
        let renormalized = TypeProportions::new(2.0, 1.0, 1.0, 0.0).renormalized().unwrap();
        assert!(!renormalized.used_fallback);
        assert!((renormalized.proportions.total() - 1.0).abs() < 1e-12);
        assert!((renormalized.proportions.complier - 0.5).abs() < 1e-12);
        assert!((renormalized.proportions.always_taker - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_renormalize_percentages() {
        let renormalized = TypeProportions::from_percentages(40.0, 30.0, 30.0, 20.0)
            .renormalized()
            .unwrap();
        let p = renormalized.proportions;
        assert!((p.total() - 1.0).abs() < 1e-12);
        assert!((p.defier - 0.2 / 1.2).abs() < 1e-12);
        assert!(p.has_defiers());
    }

    #[test]
    fn test_renormalize_all_zero_uses_default_split() {
        let renormalized = TypeProportions::new(0.0, 0.0, 0.0, 0.0).renormalized().unwrap();
        assert!(renormalized.used_fallback);
        assert_eq!(renormalized.proportions, TypeProportions::new(0.4, 0.3, 0.3, 0.0));
    }

    #[test]
    fn test_renormalize_huge_finite_shares() {
        let renormalized = TypeProportions::new(1e308, 1e308, 0.0, 0.0)
            .renormalized()
            .unwrap();
        let p = renormalized.proportions;
        assert!(!renormalized.used_fallback);
        assert!((p.complier - 0.5).abs() < 1e-12);
        assert!((p.always_taker - 0.5).abs() < 1e-12);
        assert_eq!(p.never_taker, 0.0);
        assert!((p.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_proportion_is_rejected() {
        let err = TypeProportions::new(0.5, -0.1, 0.3, 0.0)
            .renormalized()
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SimulationConfig::default().with_n(0).validate().is_err());
        assert!(
            SimulationConfig::default()
                .with_exclusion_violation(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(SimulationConfig::draft_lottery(1.2).validate().is_err());
        assert!(
            SimulationConfig::hte_no_defiers()
                .with_proportions(TypeProportions::new(0.4, 0.3, f64::INFINITY, 0.0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_effective_instrument() {
        let continuous = SimulationConfig::continuous();
        assert_eq!(continuous.effective_instrument(), InstrumentDistribution::Normal);

        let hte =
            SimulationConfig::hte_no_defiers().with_instrument(InstrumentDistribution::Normal);
        assert_eq!(hte.effective_instrument(), InstrumentDistribution::Bernoulli);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SimulationConfig::from_json(
            r#"{"mode": "heterogeneous", "seed": 7, "proportions": {"complier": 1.0, "always_taker": 1.0, "never_taker": 1.0, "defier": 1.0}}"#,
        )
        .unwrap();

        assert_eq!(config.mode, SimulationMode::Heterogeneous);
        assert_eq!(config.seed, 7);
        assert_eq!(config.n, 1000);
        assert_eq!(config.instrument_strength, 1.0);
        assert!(config.proportions.has_defiers());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            SimulationConfig::from_json(r#"{"n": 0}"#),
            Err(CoreError::Configuration { .. })
        ));
        assert!(matches!(
            SimulationConfig::from_json("not json"),
            Err(CoreError::Json(_))
        ));
    }
}
