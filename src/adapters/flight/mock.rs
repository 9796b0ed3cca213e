//! Mock flight search for testing and the demo binary.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::discovery::FlightSearchParams;
use crate::ports::{FlightOffer, FlightSearch, FlightSearchError};

/// Mock flight search with queued offer lists.
///
/// When the queue runs dry it fabricates a single plausible offer for the
/// requested route, so the demo binary always has something to show.
#[derive(Debug, Clone, Default)]
pub struct MockFlightSearch {
    offers: Arc<Mutex<VecDeque<Vec<FlightOffer>>>>,
    searches: Arc<Mutex<Vec<FlightSearchParams>>>,
}

impl MockFlightSearch {
    /// Creates a mock with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an offer list to return.
    pub fn with_offers(self, offers: Vec<FlightOffer>) -> Self {
        self.offers.lock().unwrap().push_back(offers);
        self
    }

    /// Searches received so far.
    pub fn searches(&self) -> Vec<FlightSearchParams> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlightSearch for MockFlightSearch {
    async fn search(
        &self,
        params: &FlightSearchParams,
    ) -> Result<Vec<FlightOffer>, FlightSearchError> {
        self.searches.lock().unwrap().push(params.clone());

        if let Some(queued) = self.offers.lock().unwrap().pop_front() {
            return Ok(queued);
        }

        Ok(vec![FlightOffer {
            id: format!("MOCK-{}-{}", params.origin_iata, params.destination_iata),
            carrier: "Mock Air".to_string(),
            price_total: 1234.56,
            currency: "BRL".to_string(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn params() -> FlightSearchParams {
        FlightSearchParams {
            origin_iata: "GRU".to_string(),
            destination_iata: "SSA".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2027, 2, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2027, 2, 8).unwrap(),
            adults: 2,
            children: 0,
            infants: 0,
        }
    }

    #[tokio::test]
    async fn returns_queued_offers_first() {
        let offer = FlightOffer {
            id: "OF-1".to_string(),
            carrier: "LATAM".to_string(),
            price_total: 980.0,
            currency: "BRL".to_string(),
        };
        let search = MockFlightSearch::new().with_offers(vec![offer.clone()]);

        let offers = search.search(&params()).await.unwrap();
        assert_eq!(offers, vec![offer]);
    }

    #[tokio::test]
    async fn fabricates_an_offer_when_the_queue_is_dry() {
        let search = MockFlightSearch::new();
        let offers = search.search(&params()).await.unwrap();

        assert_eq!(offers.len(), 1);
        assert!(offers[0].id.contains("GRU"));
    }

    #[tokio::test]
    async fn records_search_parameters() {
        let search = MockFlightSearch::new();
        search.search(&params()).await.unwrap();

        assert_eq!(search.searches(), vec![params()]);
    }
}
