//! Flight search port.
//!
//! Consumed only by the derived flight-params operation, never by the
//! interview pipeline itself. The provider's offer schema is reduced to the
//! handful of fields the caller presents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::discovery::FlightSearchParams;

/// One bookable flight offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub id: String,
    pub carrier: String,
    pub price_total: f64,
    pub currency: String,
}

/// Flight search failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlightSearchError {
    #[error("flight search provider failed: {0}")]
    Provider(String),

    #[error("provider rejected the search parameters: {0}")]
    Rejected(String),
}

/// Port for searching flights.
#[async_trait]
pub trait FlightSearch: Send + Sync {
    /// Searches round-trip offers for the given parameters.
    async fn search(&self, params: &FlightSearchParams) -> Result<Vec<FlightOffer>, FlightSearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_search_is_object_safe() {
        fn _accepts_dyn(_search: &dyn FlightSearch) {}
    }
}
