//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid model base URL format")]
    InvalidBaseUrl,

    #[error("Temperature must be between 0.0 and 1.0")]
    InvalidTemperature,

    #[error("Minimum budget per paying passenger must be positive")]
    InvalidMinBudget,

    #[error("Trip duration must be at least one day")]
    InvalidTripDuration,

    #[error("History window must allow at least one exchange")]
    InvalidHistoryWindow,
}
