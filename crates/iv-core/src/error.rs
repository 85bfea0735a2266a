//! Error types for configuration and data generation

/// Errors raised before or while drawing a simulated dataset
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CoreError::Configuration {
            message: message.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
