//! Conversion of finished discovery data into flight-search parameters.
//!
//! A read-only derivation: it never mutates the session. Both IATA codes
//! must be known; everything else degrades gracefully (a solo adult when no
//! composition was collected, a departure a month out when no availability
//! month parses).

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::travel_data::CollectedTravelData;
use super::validator::{validate_flight_search_counts, PassengerRuleViolation};

/// Departure offset applied when no availability month was collected.
const DEFAULT_DEPARTURE_OFFSET_DAYS: i64 = 30;

/// Month names the traveler may have used, Portuguese and English.
static MONTH_NAMES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("janeiro", 1),
        ("fevereiro", 2),
        ("março", 3),
        ("marco", 3),
        ("abril", 4),
        ("maio", 5),
        ("junho", 6),
        ("julho", 7),
        ("agosto", 8),
        ("setembro", 9),
        ("outubro", 10),
        ("novembro", 11),
        ("dezembro", 12),
        ("january", 1),
        ("february", 2),
        ("march", 3),
        ("april", 4),
        ("may", 5),
        ("june", 6),
        ("july", 7),
        ("august", 8),
        ("september", 9),
        ("october", 10),
        ("november", 11),
        ("december", 12),
    ])
});

/// Validation failures while deriving search parameters.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FlightParamsError {
    #[error("invalid passenger counts: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidCounts(Vec<PassengerRuleViolation>),
}

/// Parameters handed to the flight-search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    pub origin_iata: String,
    pub destination_iata: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl FlightSearchParams {
    /// Derives search parameters from a data snapshot.
    ///
    /// Returns `None` while either IATA code is still missing. When no
    /// composition was collected, defaults to one adult. Raises instead of
    /// clamping when the derived counts break the flight-search rules.
    pub fn from_collected(
        data: &CollectedTravelData,
        trip_duration_days: u32,
        today: NaiveDate,
    ) -> Result<Option<Self>, FlightParamsError> {
        let (Some(origin_iata), Some(destination_iata)) =
            (data.origin_iata.as_deref(), data.destination_iata.as_deref())
        else {
            return Ok(None);
        };
        if origin_iata.trim().is_empty() || destination_iata.trim().is_empty() {
            return Ok(None);
        }

        let departure_date = data
            .availability_months
            .iter()
            .flatten()
            .find_map(|name| month_number(name))
            .map(|month| first_future_occurrence(month, today))
            .unwrap_or_else(|| today + Duration::days(DEFAULT_DEPARTURE_OFFSET_DAYS));
        let return_date = departure_date + Duration::days(i64::from(trip_duration_days));

        let (adults, children, infants) = match &data.passenger_composition {
            Some(composition) => (
                composition.adults,
                composition.seated_child_count(),
                composition.lap_infant_count(),
            ),
            // sessions predating passenger collection searched for one adult
            None => (1, 0, 0),
        };

        let report = validate_flight_search_counts(adults, Some(children), Some(infants));
        if !report.is_valid() {
            return Err(FlightParamsError::InvalidCounts(report.into_violations()));
        }

        Ok(Some(Self {
            origin_iata: origin_iata.to_uppercase(),
            destination_iata: destination_iata.to_uppercase(),
            departure_date,
            return_date,
            adults,
            children,
            infants,
        }))
    }
}

/// Resolves a traveler-supplied month name to its number.
fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES.get(name.trim().to_lowercase().as_str()).copied()
}

/// First future occurrence of a month: day 1 of that month this year,
/// rolled to next year when already past; tomorrow when it is the current
/// month.
fn first_future_occurrence(month: u32, today: NaiveDate) -> NaiveDate {
    if month == today.month() {
        return today + Duration::days(1);
    }
    let year = if month > today.month() {
        today.year()
    } else {
        today.year() + 1
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
}
