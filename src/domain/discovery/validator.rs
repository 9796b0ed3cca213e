//! Passenger and budget rules.
//!
//! Pure and deterministic. Violations accumulate instead of short-circuiting
//! so a single correction request can name every problem at once. The
//! violation display strings double as the user-facing correction text.

use thiserror::Error;

use super::travel_data::{PassengerComposition, INFANT_MAX_AGE};

/// Hard cap on total travelers per booking.
pub const MAX_PASSENGERS: u32 = 9;

/// Oldest age still considered a child.
pub const CHILD_MAX_AGE: i32 = 17;

/// A single broken passenger or budget rule.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PassengerRuleViolation {
    #[error("passenger composition is missing")]
    MissingComposition,

    #[error("at least one adult is required")]
    NoAdults,

    #[error("lap infants ({infants}) cannot exceed adults ({adults})")]
    InfantsExceedAdults { infants: u32, adults: u32 },

    #[error("child age {age} is negative")]
    NegativeChildAge { age: i32 },

    #[error("child age {age} exceeds the maximum of {max}")]
    ChildAgeTooHigh { age: i32, max: i32 },

    #[error("too many passengers: {total} exceeds the maximum of {max}")]
    TooManyPassengers { total: u32, max: u32 },

    #[error(
        "budget works out to {per_passenger:.2} per paying passenger, below the minimum of {minimum:.2}"
    )]
    BudgetBelowMinimum { per_passenger: f64, minimum: f64 },
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    violations: Vec<PassengerRuleViolation>,
}

impl ValidationReport {
    /// True when no rule was broken.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The broken rules, in the order they were checked.
    pub fn violations(&self) -> &[PassengerRuleViolation] {
        &self.violations
    }

    /// Consumes the report, yielding the broken rules.
    pub fn into_violations(self) -> Vec<PassengerRuleViolation> {
        self.violations
    }

    /// User-facing messages for every broken rule.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, violation: PassengerRuleViolation) {
        self.violations.push(violation);
    }
}

/// Validates who is traveling.
///
/// Checks, in order: composition present, at least one adult, lap infants
/// not exceeding adults, every child age within 0..=17, total travelers
/// within the hard cap. All broken rules are reported.
pub fn validate_passenger_composition(
    composition: Option<&PassengerComposition>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(composition) = composition else {
        report.push(PassengerRuleViolation::MissingComposition);
        return report;
    };

    if composition.adults == 0 {
        report.push(PassengerRuleViolation::NoAdults);
    }

    let infants = composition.lap_infant_count();
    if infants > composition.adults {
        report.push(PassengerRuleViolation::InfantsExceedAdults {
            infants,
            adults: composition.adults,
        });
    }

    for child in &composition.children {
        if child.age < 0 {
            report.push(PassengerRuleViolation::NegativeChildAge { age: child.age });
        } else if child.age > CHILD_MAX_AGE {
            report.push(PassengerRuleViolation::ChildAgeTooHigh {
                age: child.age,
                max: CHILD_MAX_AGE,
            });
        }
    }

    let total = composition.total();
    if total > MAX_PASSENGERS {
        report.push(PassengerRuleViolation::TooManyPassengers {
            total,
            max: MAX_PASSENGERS,
        });
    }

    report
}

/// Validates that the budget covers every paying passenger.
///
/// Lap infants and non-paying children are excluded from the per-person
/// split.
pub fn validate_budget_for_passengers(
    total_budget: f64,
    composition: &PassengerComposition,
    min_per_paying_passenger: f64,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    // paying count is zero only for compositions that already failed
    // passenger validation
    let paying = composition.paying_count().max(1);
    let per_passenger = total_budget / paying as f64;

    if per_passenger < min_per_paying_passenger {
        report.push(PassengerRuleViolation::BudgetBelowMinimum {
            per_passenger,
            minimum: min_per_paying_passenger,
        });
    }

    report
}

/// Validates the bare counts handed to a flight search.
///
/// Same adult/infant/cap rules as the full composition check, minus the
/// per-child ages the search API never sees.
pub fn validate_flight_search_counts(
    adults: u32,
    children: Option<u32>,
    infants: Option<u32>,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let children = children.unwrap_or(0);
    let infants = infants.unwrap_or(0);

    if adults == 0 {
        report.push(PassengerRuleViolation::NoAdults);
    }

    if infants > adults {
        report.push(PassengerRuleViolation::InfantsExceedAdults { infants, adults });
    }

    let total = adults + children + infants;
    if total > MAX_PASSENGERS {
        report.push(PassengerRuleViolation::TooManyPassengers {
            total,
            max: MAX_PASSENGERS,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discovery::travel_data::ChildTraveler;

    fn child(age: i32, is_paying: bool) -> ChildTraveler {
        ChildTraveler { age, is_paying }
    }

    mod passenger_composition {
        use super::*;

        #[test]
        fn missing_composition_fails() {
            let report = validate_passenger_composition(None);
            assert!(!report.is_valid());
            assert_eq!(
                report.violations(),
                &[PassengerRuleViolation::MissingComposition]
            );
        }

        #[test]
        fn zero_adults_fails() {
            let composition = PassengerComposition::adults_only(0);
            let report = validate_passenger_composition(Some(&composition));
            assert!(report
                .violations()
                .contains(&PassengerRuleViolation::NoAdults));
        }

        #[test]
        fn two_infants_one_adult_fails() {
            let composition = PassengerComposition {
                adults: 1,
                children: vec![child(0, false), child(1, false)],
            };
            let report = validate_passenger_composition(Some(&composition));
            assert!(report.violations().contains(
                &PassengerRuleViolation::InfantsExceedAdults {
                    infants: 2,
                    adults: 1
                }
            ));
        }

        #[test]
        fn two_adults_one_paying_child_passes() {
            let composition = PassengerComposition {
                adults: 2,
                children: vec![child(5, true)],
            };
            let report = validate_passenger_composition(Some(&composition));
            assert!(report.is_valid());
        }

        #[test]
        fn negative_and_too_high_ages_get_distinct_messages() {
            let composition = PassengerComposition {
                adults: 2,
                children: vec![child(-1, true), child(18, true)],
            };
            let report = validate_passenger_composition(Some(&composition));

            assert!(report
                .violations()
                .contains(&PassengerRuleViolation::NegativeChildAge { age: -1 }));
            assert!(report
                .violations()
                .contains(&PassengerRuleViolation::ChildAgeTooHigh { age: 18, max: 17 }));
        }

        #[test]
        fn more_than_nine_travelers_fails() {
            let composition = PassengerComposition {
                adults: 4,
                children: (0..6).map(|_| child(10, true)).collect(),
            };
            let report = validate_passenger_composition(Some(&composition));
            assert!(report
                .violations()
                .contains(&PassengerRuleViolation::TooManyPassengers { total: 10, max: 9 }));
        }

        #[test]
        fn violations_accumulate_instead_of_short_circuiting() {
            let composition = PassengerComposition {
                adults: 0,
                children: vec![child(-3, false)],
            };
            let report = validate_passenger_composition(Some(&composition));

            // no adults + infants exceed adults + negative age
            assert_eq!(report.violations().len(), 3);
        }

        #[test]
        fn messages_match_violation_display() {
            let report = validate_passenger_composition(None);
            assert_eq!(report.messages(), vec!["passenger composition is missing"]);
        }
    }

    mod budget {
        use super::*;

        #[test]
        fn sufficient_budget_passes() {
            let composition = PassengerComposition::adults_only(2);
            let report = validate_budget_for_passengers(3000.0, &composition, 500.0);
            assert!(report.is_valid());
        }

        #[test]
        fn insufficient_budget_reports_both_amounts() {
            let composition = PassengerComposition::adults_only(4);
            let report = validate_budget_for_passengers(1000.0, &composition, 500.0);

            assert_eq!(
                report.violations(),
                &[PassengerRuleViolation::BudgetBelowMinimum {
                    per_passenger: 250.0,
                    minimum: 500.0
                }]
            );
            assert!(report.messages()[0].contains("250.00"));
            assert!(report.messages()[0].contains("500.00"));
        }

        #[test]
        fn lap_infants_do_not_split_the_budget() {
            let composition = PassengerComposition {
                adults: 2,
                children: vec![child(1, false)],
            };
            // 1100 / 2 paying = 550, above the 500 minimum
            let report = validate_budget_for_passengers(1100.0, &composition, 500.0);
            assert!(report.is_valid());
        }
    }

    mod flight_search_counts {
        use super::*;

        #[test]
        fn defaults_children_and_infants_to_zero() {
            let report = validate_flight_search_counts(1, None, None);
            assert!(report.is_valid());
        }

        #[test]
        fn zero_adults_fails() {
            let report = validate_flight_search_counts(0, Some(1), None);
            assert!(report
                .violations()
                .contains(&PassengerRuleViolation::NoAdults));
        }

        #[test]
        fn infants_exceeding_adults_fails() {
            let report = validate_flight_search_counts(1, None, Some(2));
            assert!(report.violations().contains(
                &PassengerRuleViolation::InfantsExceedAdults {
                    infants: 2,
                    adults: 1
                }
            ));
        }

        #[test]
        fn cap_applies_to_the_sum() {
            let report = validate_flight_search_counts(5, Some(4), Some(1));
            assert!(report
                .violations()
                .contains(&PassengerRuleViolation::TooManyPassengers { total: 10, max: 9 }));
        }
    }
}
