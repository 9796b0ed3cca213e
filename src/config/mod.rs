//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `TRIP_SCOUT`
//! prefix and nested sections use `__` (double underscore) as separator.
//!
//! # Example
//!
//! ```no_run
//! use trip_scout::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod discovery;
mod error;
mod model;

pub use discovery::DiscoveryConfig;
pub use error::{ConfigError, ValidationError};
pub use model::ModelConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Model provider configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Discovery interview tuning.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads `.env` if present (development), then reads variables such as
    /// `TRIP_SCOUT__MODEL__API_KEY` and `TRIP_SCOUT__DISCOVERY__MIN_BUDGET_PER_PAYING_PASSENGER`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRIP_SCOUT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.model.validate()?;
        self.discovery.validate()?;
        Ok(())
    }
}
