//! Structural equations
//!
//! Three data-generating processes share one generator:
//!
//! - continuous: `X = γZ + δU + e1`, `Y = βX + αU + φZ + e2`
//! - draft lottery: `X = 1{γZ + (1-γ)B + 0.1U > 0.5}`, same outcome equation
//! - heterogeneous: `D` from the compliance type, `Y = β_type·D + U`
//!
//! Draws are taken in a fixed order (Z, U, then mode-specific draws) so the
//! dataset is a pure function of the configuration.

use tracing::debug;

use super::{DataGenerator, FloatArray, SimulatedDataset};
use crate::config::{CONFOUNDER_EFFECT, SimulationConfig, SimulationMode, TRUE_EFFECT};
use crate::error::Result;

/// Weight of the confounder in the draft-lottery enlistment index
const LOTTERY_CONFOUNDER_WEIGHT: f64 = 0.1;

/// Enlistment index above which a unit is treated
const LOTTERY_THRESHOLD: f64 = 0.5;

/// Applies the structural model selected by a configuration
#[derive(Debug, Clone, Copy)]
pub struct StructuralSimulator<'a> {
    config: &'a SimulationConfig,
}

impl<'a> StructuralSimulator<'a> {
    /// Validate the configuration and wrap it
    pub fn new(config: &'a SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Draw a complete dataset
    pub fn simulate(&self) -> Result<SimulatedDataset> {
        let config = self.config;
        debug!(
            mode = ?config.mode,
            n = config.n,
            seed = config.seed,
            "simulating dataset"
        );

        let mut generator = DataGenerator::new(config.seed);
        let z = generator.instrument(config.n, config.effective_instrument())?;
        let u = generator.confounder(config.n)?;

        match config.mode {
            SimulationMode::Continuous => self.continuous(&mut generator, z, u),
            SimulationMode::DraftLottery => self.draft_lottery(&mut generator, z, u),
            SimulationMode::Heterogeneous => self.heterogeneous(&mut generator, z, u),
        }
    }

    fn continuous(
        &self,
        generator: &mut DataGenerator,
        z: FloatArray,
        u: FloatArray,
    ) -> Result<SimulatedDataset> {
        let gamma = self.config.instrument_strength;
        let delta = self.config.error_transmission;

        let e1 = generator.noise(self.config.n)?;
        let x = &z * gamma + &u * delta + &e1;

        let e2 = generator.noise(self.config.n)?;
        let y = self.outcome(&x, &u, &z, &e2);

        SimulatedDataset::new(SimulationMode::Continuous, u, z, x, y)
    }

    fn draft_lottery(
        &self,
        generator: &mut DataGenerator,
        z: FloatArray,
        u: FloatArray,
    ) -> Result<SimulatedDataset> {
        let compliance = self.config.instrument_strength;

        let coin = generator.coin_flips(self.config.n)?;
        let index = &z * compliance + &coin * (1.0 - compliance) + &u * LOTTERY_CONFOUNDER_WEIGHT;
        let x = index.mapv(|v| if v > LOTTERY_THRESHOLD { 1.0 } else { 0.0 });

        let e2 = generator.noise(self.config.n)?;
        let y = self.outcome(&x, &u, &z, &e2);

        SimulatedDataset::new(SimulationMode::DraftLottery, u, z, x, y)
    }

    fn heterogeneous(
        &self,
        generator: &mut DataGenerator,
        z: FloatArray,
        u: FloatArray,
    ) -> Result<SimulatedDataset> {
        let renormalized = self.config.proportions.renormalized()?;
        let types = generator.compliance_types(self.config.n, &renormalized.proportions)?;

        let d: FloatArray = types
            .iter()
            .zip(z.iter())
            .map(|(kind, &zi)| kind.treatment(zi))
            .collect();
        let y: FloatArray = types
            .iter()
            .zip(d.iter().zip(u.iter()))
            .map(|(kind, (&di, &ui))| kind.true_effect() * di + ui)
            .collect();

        SimulatedDataset::new(SimulationMode::Heterogeneous, u, z, d, y)?.with_types(
            types,
            renormalized.proportions,
            renormalized.used_fallback,
        )
    }

    /// `Y = βX + αU + φZ + e`
    fn outcome(
        &self,
        x: &FloatArray,
        u: &FloatArray,
        z: &FloatArray,
        e: &FloatArray,
    ) -> FloatArray {
        x * TRUE_EFFECT + u * CONFOUNDER_EFFECT + z * self.config.exclusion_violation + e
    }
}

/// Convenience function: validate `config` and draw its dataset
pub fn simulate(config: &SimulationConfig) -> Result<SimulatedDataset> {
    StructuralSimulator::new(config)?.simulate()
}
