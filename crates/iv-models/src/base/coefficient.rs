//! Coefficient definition

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a coefficient table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Coefficient name
    pub name: String,
    /// Coefficient estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: Option<f64>,
    /// t-statistic
    pub t_stat: Option<f64>,
    /// p-value
    pub p_value: Option<f64>,
    /// Is this the intercept?
    pub is_intercept: bool,
}

impl Coefficient {
    /// Create a new coefficient
    pub fn new(name: impl Into<String>, estimate: f64) -> Self {
        Self {
            name: name.into(),
            estimate,
            std_error: None,
            t_stat: None,
            p_value: None,
            is_intercept: false,
        }
    }

    /// Set standard error
    pub fn with_std_error(mut self, se: f64) -> Self {
        self.std_error = Some(se);
        self
    }

    /// Set t-statistic
    pub fn with_t_stat(mut self, t: f64) -> Self {
        self.t_stat = Some(t);
        self
    }

    /// Set p-value
    pub fn with_p_value(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    /// Mark as intercept
    pub fn as_intercept(mut self) -> Self {
        self.is_intercept = true;
        self
    }

    /// Significance stars from the p-value
    pub fn significance(&self) -> &'static str {
        match self.p_value {
            Some(p) if p < 0.001 => "***",
            Some(p) if p < 0.01 => "**",
            Some(p) if p < 0.05 => "*",
            Some(p) if p < 0.1 => ".",
            _ => "",
        }
    }
}

/// Table row; missing statistics print as `NA`
impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell =
            |value: Option<f64>| value.map_or_else(|| "NA".to_string(), |v| format!("{:.6}", v));
        write!(
            f,
            "{:<20} {:>12.6} {:>12} {:>12} {:>12} {}",
            self.name,
            self.estimate,
            cell(self.std_error),
            cell(self.t_stat),
            cell(self.p_value),
            self.significance()
        )
    }
}
