//! Model summary structures

use super::coefficient::Coefficient;
use super::statistics::ModelStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Printable summary of one fitted regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model type
    pub model_type: ModelType,
    /// Regression written as `response ~ regressor`
    pub formula: String,
    /// Number of observations
    pub n_obs: usize,
    /// Coefficients table
    pub coefficients: Vec<Coefficient>,
    /// Model statistics
    pub model_statistics: ModelStatistics,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.model_type)?;
        writeln!(f, "{:=<1$}", "", self.model_type.to_string().len())?;
        writeln!(f, "Formula: {}", self.formula)?;
        writeln!(f, "Observations: {}", self.n_obs)?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<20} {:>12} {:>12} {:>12} {:>12}",
            "Term", "Estimate", "Std Error", "t-value", "p-value"
        )?;
        writeln!(
            f,
            "{:-<20} {:-<12} {:-<12} {:-<12} {:-<12}",
            "", "", "", "", ""
        )?;

        for coeff in &self.coefficients {
            writeln!(f, "{}", coeff)?;
        }
        writeln!(f)?;

        let stats = &self.model_statistics;
        writeln!(f, "  R-squared: {:.4}", stats.r_squared)?;
        if let Some(adj_r2) = stats.adj_r_squared {
            writeln!(f, "  Adjusted R-squared: {:.4}", adj_r2)?;
        }
        if let Some(resid_se) = stats.residual_std_error {
            writeln!(f, "  Residual Std. Error: {:.4}", resid_se)?;
        }
        writeln!(f, "  Residual DF: {}", stats.df_residual)?;

        Ok(())
    }
}

/// Which regression a summary describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Direct regression of outcome on treatment
    Ols,
    /// Treatment on instrument
    FirstStage,
    /// Outcome on first-stage fitted treatment
    SecondStage,
    /// Second stage reported with IV standard errors
    TwoStageLeastSquares,
    /// Any other least-squares fit
    Other(String),
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Ols => write!(f, "OLS Regression"),
            ModelType::FirstStage => write!(f, "2SLS First Stage"),
            ModelType::SecondStage => write!(f, "2SLS Second Stage"),
            ModelType::TwoStageLeastSquares => write!(f, "2SLS (IV) Regression"),
            ModelType::Other(s) => write!(f, "{}", s),
        }
    }
}
