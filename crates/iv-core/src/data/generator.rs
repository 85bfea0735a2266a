//! Seeded random draws
//!
//! Every draw of a simulation run comes from one [`DataGenerator`], so the
//! whole dataset is reproducible from the seed alone.

use rand::distr::Bernoulli;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::{ComplianceType, FloatArray};
use crate::config::{InstrumentDistribution, TypeProportions};
use crate::error::{CoreError, Result};

/// Source of the exogenous draws of a simulation run
#[derive(Debug, Clone)]
pub struct DataGenerator {
    rng: StdRng,
}

impl DataGenerator {
    /// Create a generator from a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Unobserved confounder `U ~ Normal(0, 1)`
    pub fn confounder(&mut self, n: usize) -> Result<FloatArray> {
        self.standard_normal(n)
    }

    /// Fresh structural-equation noise `e ~ Normal(0, 1)`
    pub fn noise(&mut self, n: usize) -> Result<FloatArray> {
        self.standard_normal(n)
    }

    /// Instrument draws from the given distribution
    pub fn instrument(&mut self, n: usize, dist: InstrumentDistribution) -> Result<FloatArray> {
        match dist {
            InstrumentDistribution::Normal => self.standard_normal(n),
            InstrumentDistribution::Bernoulli => self.coin_flips(n),
        }
    }

    /// Fair coin flips coded as 0.0 / 1.0
    pub fn coin_flips(&mut self, n: usize) -> Result<FloatArray> {
        check_size(n)?;
        let coin = Bernoulli::new(0.5).map_err(|e| CoreError::Distribution(e.to_string()))?;

        Ok((0..n)
            .map(|_| if self.rng.sample(coin) { 1.0 } else { 0.0 })
            .collect())
    }

    /// One categorical compliance-type draw per observation
    ///
    /// `proportions` must already be renormalized.
    pub fn compliance_types(
        &mut self,
        n: usize,
        proportions: &TypeProportions,
    ) -> Result<Vec<ComplianceType>> {
        check_size(n)?;
        let categorical = WeightedIndex::new(proportions.as_weights())
            .map_err(|e| CoreError::Distribution(e.to_string()))?;

        Ok((0..n)
            .map(|_| ComplianceType::ALL[self.rng.sample(&categorical)])
            .collect())
    }

    fn standard_normal(&mut self, n: usize) -> Result<FloatArray> {
        check_size(n)?;
        Ok((0..n)
            .map(|_| self.rng.sample::<f64, _>(StandardNormal))
            .collect())
    }
}

fn check_size(n: usize) -> Result<()> {
    if n == 0 {
        return Err(CoreError::config("number of draws must be positive"));
    }
    Ok(())
}
