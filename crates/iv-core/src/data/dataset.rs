//! Simulated dataset
//!
//! Columns are stored as arrays; rows are exposed as [`Observation`] values
//! for consumers that walk the sample one unit at a time.

use indexmap::IndexMap;
use serde::Serialize;

use super::{ComplianceType, FloatArray};
use crate::config::{SimulationMode, TypeProportions};
use crate::error::{CoreError, Result};

/// One simulated unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Unobserved confounder U
    pub u: f64,
    /// Instrument Z
    pub z: f64,
    /// Treatment X (D in heterogeneous mode)
    pub x: f64,
    /// Outcome Y
    pub y: f64,
    /// Latent type, heterogeneous mode only
    pub compliance_type: Option<ComplianceType>,
}

/// Output of one structural simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedDataset {
    mode: SimulationMode,
    confounder: FloatArray,
    instrument: FloatArray,
    treatment: FloatArray,
    outcome: FloatArray,
    types: Option<Vec<ComplianceType>>,
    proportions: Option<TypeProportions>,
    proportion_fallback: bool,
}

impl SimulatedDataset {
    /// Assemble a dataset from equally long columns
    pub fn new(
        mode: SimulationMode,
        confounder: FloatArray,
        instrument: FloatArray,
        treatment: FloatArray,
        outcome: FloatArray,
    ) -> Result<Self> {
        let n = confounder.len();
        for (name, len) in [
            ("instrument", instrument.len()),
            ("treatment", treatment.len()),
            ("outcome", outcome.len()),
        ] {
            if len != n {
                return Err(CoreError::config(format!(
                    "column {} has {} rows, expected {}",
                    name, len, n
                )));
            }
        }

        Ok(Self {
            mode,
            confounder,
            instrument,
            treatment,
            outcome,
            types: None,
            proportions: None,
            proportion_fallback: false,
        })
    }

    /// Attach the latent compliance types and the shares they were drawn from
    pub fn with_types(
        mut self,
        types: Vec<ComplianceType>,
        proportions: TypeProportions,
        used_fallback: bool,
    ) -> Result<Self> {
        if types.len() != self.len() {
            return Err(CoreError::config(format!(
                "{} compliance types for {} observations",
                types.len(),
                self.len()
            )));
        }
        self.types = Some(types);
        self.proportions = Some(proportions);
        self.proportion_fallback = used_fallback;
        Ok(self)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.confounder.len()
    }

    /// Whether the dataset has no observations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structural model that produced the data
    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// U column
    pub fn confounder(&self) -> &FloatArray {
        &self.confounder
    }

    /// Z column
    pub fn instrument(&self) -> &FloatArray {
        &self.instrument
    }

    /// X / D column
    pub fn treatment(&self) -> &FloatArray {
        &self.treatment
    }

    /// Y column
    pub fn outcome(&self) -> &FloatArray {
        &self.outcome
    }

    /// Latent types, heterogeneous mode only
    pub fn types(&self) -> Option<&[ComplianceType]> {
        self.types.as_deref()
    }

    /// Renormalized shares the types were drawn from
    pub fn proportions(&self) -> Option<&TypeProportions> {
        self.proportions.as_ref()
    }

    /// Whether the default shares replaced an all-zero input
    pub fn used_proportion_fallback(&self) -> bool {
        self.proportion_fallback
    }

    /// Name of the treatment column
    pub fn treatment_label(&self) -> &'static str {
        if self.mode.is_heterogeneous() { "D" } else { "X" }
    }

    /// Row `i`, if it exists
    pub fn observation(&self, i: usize) -> Option<Observation> {
        if i >= self.len() {
            return None;
        }

        Some(Observation {
            u: self.confounder[i],
            z: self.instrument[i],
            x: self.treatment[i],
            y: self.outcome[i],
            compliance_type: self.types.as_ref().map(|types| types[i]),
        })
    }

    /// Iterate over rows in order
    pub fn observations(&self) -> ObservationIter<'_> {
        ObservationIter {
            dataset: self,
            pos: 0,
        }
    }

    /// Named columns in `U, Z, X, Y` order
    pub fn columns(&self) -> IndexMap<&'static str, &FloatArray> {
        let mut columns = IndexMap::with_capacity(4);
        columns.insert("U", &self.confounder);
        columns.insert("Z", &self.instrument);
        columns.insert(self.treatment_label(), &self.treatment);
        columns.insert("Y", &self.outcome);
        columns
    }

    /// Sample count per compliance type, in [`ComplianceType::ALL`] order
    pub fn type_counts(&self) -> Option<[usize; 4]> {
        let types = self.types.as_ref()?;
        let mut counts = [0usize; 4];
        for kind in types {
            counts[kind.index()] += 1;
        }
        Some(counts)
    }
}

/// Row iterator over a [`SimulatedDataset`]
pub struct ObservationIter<'a> {
    dataset: &'a SimulatedDataset,
    pos: usize,
}

impl Iterator for ObservationIter<'_> {
    type Item = Observation;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.dataset.observation(self.pos)?;
        self.pos += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ObservationIter<'_> {}
