//! Accumulated travel data and the monotonic merge that grows it.
//!
//! Every field is nullable until collected. The model returns partial
//! objects most turns, frequently nulling out fields it did not re-derive,
//! so the merge is a per-field union: a non-null incoming value overwrites,
//! a null incoming value preserves what is already known. Empty lists and
//! blank strings count as not-yet-collected.

use serde::{Deserialize, Deserializer, Serialize};

/// Oldest age still counted as a lap infant.
pub const INFANT_MAX_AGE: i32 = 1;

/// Age assumed when a legacy payload reports children as a bare count.
///
/// Older clients sent `"children": 2` instead of the per-child list; those
/// payloads are materialized as paying school-age children.
pub const LEGACY_CHILD_AGE: i32 = 12;

/// One child traveler.
///
/// Ages stay signed so wire-level nonsense (negative ages) survives to
/// validation instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTraveler {
    pub age: i32,
    #[serde(rename = "isPaying", default = "default_is_paying")]
    pub is_paying: bool,
}

fn default_is_paying() -> bool {
    true
}

/// Who is traveling.
///
/// The canonical `children` representation is the per-child list; counts
/// are always derived from it, never stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerComposition {
    #[serde(default)]
    pub adults: u32,
    #[serde(default, deserialize_with = "children_compat")]
    pub children: Vec<ChildTraveler>,
}

impl PassengerComposition {
    /// Creates a composition of adults only.
    pub fn adults_only(adults: u32) -> Self {
        Self {
            adults,
            children: Vec::new(),
        }
    }

    /// Total travelers, adults and children.
    pub fn total(&self) -> u32 {
        self.adults + self.children.len() as u32
    }

    /// Travelers whose fare counts toward the budget: adults plus paying
    /// children.
    pub fn paying_count(&self) -> u32 {
        let paying_children = self.children.iter().filter(|c| c.is_paying).count() as u32;
        self.adults + paying_children
    }

    /// Children who travel on an adult's lap: infant-aged or non-paying.
    pub fn lap_infant_count(&self) -> u32 {
        self.children
            .iter()
            .filter(|c| c.age <= INFANT_MAX_AGE || !c.is_paying)
            .count() as u32
    }

    /// Children who occupy their own seat.
    pub fn seated_child_count(&self) -> u32 {
        self.children.len() as u32 - self.lap_infant_count()
    }
}

/// Accepts the legacy integer-count wire variant for `children` alongside
/// the canonical per-child list.
fn children_compat<'de, D>(deserializer: D) -> Result<Vec<ChildTraveler>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Count(u32),
        List(Vec<ChildTraveler>),
    }

    Ok(match Option::<Wire>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Wire::Count(n)) => (0..n)
            .map(|_| ChildTraveler {
                age: LEGACY_CHILD_AGE,
                is_paying: true,
            })
            .collect(),
        Some(Wire::List(list)) => list,
    })
}

/// Everything learned about the trip so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectedTravelData {
    pub origin_name: Option<String>,
    pub origin_iata: Option<String>,
    pub destination_name: Option<String>,
    pub destination_iata: Option<String>,
    pub budget_in_brl: Option<f64>,
    pub activities: Option<Vec<String>>,
    pub hobbies: Option<Vec<String>>,
    pub availability_months: Option<Vec<String>>,
    pub purpose: Option<String>,
    pub passenger_composition: Option<PassengerComposition>,
}

impl CollectedTravelData {
    /// Folds newly parsed fields into this snapshot.
    ///
    /// Per-field union: a collected incoming value overwrites, an absent one
    /// preserves the prior value. Never a whole-struct overwrite — the model
    /// returns partial objects most turns. Idempotent.
    pub fn merge(&self, incoming: &Self) -> Self {
        Self {
            origin_name: pick_text(&incoming.origin_name, &self.origin_name),
            origin_iata: pick_text(&incoming.origin_iata, &self.origin_iata),
            destination_name: pick_text(&incoming.destination_name, &self.destination_name),
            destination_iata: pick_text(&incoming.destination_iata, &self.destination_iata),
            budget_in_brl: incoming.budget_in_brl.or(self.budget_in_brl),
            activities: pick_list(&incoming.activities, &self.activities),
            hobbies: pick_list(&incoming.hobbies, &self.hobbies),
            availability_months: pick_list(
                &incoming.availability_months,
                &self.availability_months,
            ),
            purpose: pick_text(&incoming.purpose, &self.purpose),
            passenger_composition: incoming
                .passenger_composition
                .clone()
                .or_else(|| self.passenger_composition.clone()),
        }
    }

    /// True when nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Origin city and IATA code are both known.
    pub fn has_origin(&self) -> bool {
        filled(&self.origin_name) && filled(&self.origin_iata)
    }

    /// Destination city and IATA code are both known.
    pub fn has_destination(&self) -> bool {
        filled(&self.destination_name) && filled(&self.destination_iata)
    }

    /// A positive budget is known.
    pub fn has_budget(&self) -> bool {
        matches!(self.budget_in_brl, Some(b) if b > 0.0)
    }

    /// A composition with at least one adult is known.
    pub fn has_passengers(&self) -> bool {
        matches!(&self.passenger_composition, Some(c) if c.adults >= 1)
    }

    /// At least one availability month is known.
    pub fn has_availability(&self) -> bool {
        matches!(&self.availability_months, Some(m) if !m.is_empty())
    }

    /// At least one desired activity is known.
    pub fn has_activities(&self) -> bool {
        matches!(&self.activities, Some(a) if !a.is_empty())
    }

    /// The trip purpose is known.
    pub fn has_purpose(&self) -> bool {
        filled(&self.purpose)
    }
}

fn filled(value: &Option<String>) -> bool {
    matches!(value, Some(s) if !s.trim().is_empty())
}

fn pick_text(incoming: &Option<String>, previous: &Option<String>) -> Option<String> {
    match incoming {
        Some(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => previous.clone(),
    }
}

fn pick_list(incoming: &Option<Vec<String>>, previous: &Option<Vec<String>>) -> Option<Vec<String>> {
    match incoming {
        Some(v) if !v.is_empty() => Some(v.clone()),
        _ => previous.clone(),
    }
}
