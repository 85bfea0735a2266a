//! Simulated data for IV experiments
//!
//! This module turns a [`SimulationConfig`](crate::config::SimulationConfig)
//! into a [`SimulatedDataset`]: seeded draws from the [`DataGenerator`] are
//! pushed through the structural equations of the selected mode by the
//! [`StructuralSimulator`].

mod compliance;
mod dataset;
mod generator;
mod simulator;
pub mod stats;


// Re-exports
pub use compliance::{ComplianceType, TreatmentRule};
pub use dataset::{Observation, ObservationIter, SimulatedDataset};
pub use generator::DataGenerator;
pub use simulator::{StructuralSimulator, simulate};

// Type aliases for common use cases
pub type FloatArray = ndarray::Array1<f64>;
pub type FloatView<'a> = ndarray::ArrayView1<'a, f64>;
