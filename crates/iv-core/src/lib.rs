//! Core building blocks for IvOxide
//!
//! This crate holds everything that happens before estimation: the
//! simulation configuration, the seeded random draws, and the structural
//! equations that turn those draws into a dataset with an endogenous
//! treatment, an instrument and an unobserved confounder.

pub mod config;
pub mod data;
pub mod error;

pub use config::{
    CONFOUNDER_EFFECT, InstrumentDistribution, Renormalized, SimulationConfig, SimulationMode,
    TRUE_EFFECT, TypeProportions,
};
pub use data::{
    ComplianceType, DataGenerator, Observation, SimulatedDataset, StructuralSimulator, simulate,
};
pub use error::{CoreError, Result};
