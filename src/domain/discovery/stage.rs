//! Interview stages and the canonical stage calculator.
//!
//! The stage is always derived from the collected-data snapshot. The model
//! reports a stage of its own in every reply, but it has been observed to
//! disagree with the data it actually returned, so the claimed stage is
//! discarded and recomputed here each turn.

use serde::{Deserialize, Serialize};

use super::travel_data::CollectedTravelData;

/// Canonical stage of the discovery interview.
///
/// Stages follow the field-dependency order of the collector and terminate
/// at `RecommendationReady`. `CollectingHobbies` is accepted on the wire but
/// never produced by the calculator; `Error` marks sessions whose pipeline
/// failed unrecoverably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    CollectingOrigin,
    CollectingBudget,
    CollectingPassengers,
    CollectingAvailability,
    CollectingActivities,
    CollectingPurpose,
    CollectingHobbies,
    RecommendationReady,
    Error,
}

impl ConversationStage {
    /// Returns the interviewing directive for this stage.
    ///
    /// Feeds the system prompt so the model knows what to ask next.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::CollectingOrigin => {
                "Ask where the traveler is departing from. Resolve the city to its IATA code."
            }
            Self::CollectingBudget => {
                "Ask for the total trip budget in BRL for all travelers combined."
            }
            Self::CollectingPassengers => {
                "Ask who is traveling: number of adults, and each child's age."
            }
            Self::CollectingAvailability => {
                "Ask which months the traveler is available to fly."
            }
            Self::CollectingActivities => {
                "Ask what activities the traveler wants on this trip."
            }
            Self::CollectingPurpose => {
                "Ask what the purpose of the trip is (leisure, celebration, rest, adventure)."
            }
            Self::CollectingHobbies => {
                "Ask about hobbies and interests to refine the destination match."
            }
            Self::RecommendationReady => {
                "All required data is collected. Recommend a destination with its IATA code."
            }
            Self::Error => "Apologize and ask the traveler to try again.",
        }
    }

    /// Returns a short label for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CollectingOrigin => "Origin",
            Self::CollectingBudget => "Budget",
            Self::CollectingPassengers => "Passengers",
            Self::CollectingAvailability => "Availability",
            Self::CollectingActivities => "Activities",
            Self::CollectingPurpose => "Purpose",
            Self::CollectingHobbies => "Hobbies",
            Self::RecommendationReady => "Recommendation",
            Self::Error => "Error",
        }
    }

    /// Returns true if no further collection happens in this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RecommendationReady | Self::Error)
    }
}

impl Default for ConversationStage {
    fn default() -> Self {
        Self::CollectingOrigin
    }
}

/// Recomputes the canonical stage from a data snapshot.
///
/// Walks the field-dependency order and returns the stage of the first
/// unmet requirement. When the model declares a final recommendation the
/// interview is over regardless of completeness.
pub fn calculate_correct_stage(
    data: &CollectedTravelData,
    is_final_recommendation: bool,
) -> ConversationStage {
    if is_final_recommendation {
        return ConversationStage::RecommendationReady;
    }
    if !data.has_origin() {
        return ConversationStage::CollectingOrigin;
    }
    if !data.has_budget() {
        return ConversationStage::CollectingBudget;
    }
    if !data.has_passengers() {
        return ConversationStage::CollectingPassengers;
    }
    if !data.has_availability() {
        return ConversationStage::CollectingAvailability;
    }
    if !data.has_activities() {
        return ConversationStage::CollectingActivities;
    }
    if !data.has_purpose() {
        return ConversationStage::CollectingPurpose;
    }
    ConversationStage::RecommendationReady
}
