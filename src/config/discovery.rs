//! Discovery interview tuning

use serde::Deserialize;

use super::error::ValidationError;

/// Discovery interview tuning
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Minimum viable budget per paying passenger, in BRL.
    #[serde(default = "default_min_budget")]
    pub min_budget_per_paying_passenger: f64,

    /// Trip duration assumed when the caller supplies none, in days.
    #[serde(default = "default_trip_duration")]
    pub default_trip_duration_days: u32,

    /// How many transcript messages travel to the model each turn.
    #[serde(default = "default_history_window")]
    pub max_history_messages: usize,
}

impl DiscoveryConfig {
    /// Validate discovery configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_budget_per_paying_passenger <= 0.0 {
            return Err(ValidationError::InvalidMinBudget);
        }
        if self.default_trip_duration_days == 0 {
            return Err(ValidationError::InvalidTripDuration);
        }
        if self.max_history_messages < 2 {
            return Err(ValidationError::InvalidHistoryWindow);
        }
        Ok(())
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_budget_per_paying_passenger: default_min_budget(),
            default_trip_duration_days: default_trip_duration(),
            max_history_messages: default_history_window(),
        }
    }
}

fn default_min_budget() -> f64 {
    500.0
}

fn default_trip_duration() -> u32 {
    7
}

fn default_history_window() -> usize {
    40
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DiscoveryConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_min_budget() {
        let config = DiscoveryConfig {
            min_budget_per_paying_passenger: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMinBudget)
        ));
    }

    #[test]
    fn rejects_zero_trip_duration() {
        let config = DiscoveryConfig {
            default_trip_duration_days: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTripDuration)
        ));
    }

    #[test]
    fn rejects_tiny_history_window() {
        let config = DiscoveryConfig {
            max_history_messages: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidHistoryWindow)
        ));
    }
}
