//! System prompt construction for the discovery interview.
//!
//! The prompt re-anchors the model every turn: canonical stage, the full
//! data snapshot, and the copy-forward instruction that keeps the model from
//! nulling out fields it did not re-derive.

use super::stage::ConversationStage;
use super::travel_data::CollectedTravelData;

/// Builds stage- and data-aware system prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Creates a builder.
    pub fn new() -> Self {
        Self
    }

    /// Builds the system prompt for one turn.
    pub fn system_prompt(&self, stage: ConversationStage, data: &CollectedTravelData) -> String {
        let snapshot = serde_json::to_string_pretty(data)
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "You are a travel discovery assistant interviewing a traveler to plan a trip.\n\
             Speak the traveler's language (often Brazilian Portuguese). Ask exactly one \
             question per turn.\n\n\
             Current interview stage: {stage}\n\
             Focus for this stage: {directive}\n\n\
             Data collected so far:\n{snapshot}\n\n\
             Copy every non-null field above into your reply exactly as given. Never set a \
             previously collected field back to null. Only add or correct fields the \
             traveler addressed in their latest message.\n\n\
             Respond with a single JSON object and nothing else — no prose, no code fences:\n\
             {{\n\
             \x20 \"conversation_stage\": one of \"collecting_origin\", \"collecting_budget\", \
             \"collecting_passengers\", \"collecting_availability\", \"collecting_activities\", \
             \"collecting_purpose\", \"collecting_hobbies\", \"recommendation_ready\",\n\
             \x20 \"data_collected\": {{\"origin_name\", \"origin_iata\", \"destination_name\", \
             \"destination_iata\", \"budget_in_brl\", \"activities\", \"hobbies\", \
             \"availability_months\", \"purpose\", \"passenger_composition\"}} with null for \
             anything unknown,\n\
             \x20 \"assistant_message\": your next question or recommendation as plain text,\n\
             \x20 \"is_final_recommendation\": true only when recommending a destination with \
             both destination_name and destination_iata filled,\n\
             \x20 \"next_question_key\": the data field your question targets, or null\n\
             }}\n\n\
             passenger_composition is {{\"adults\": number, \"children\": \
             [{{\"age\": number, \"isPaying\": boolean}}]}}. IATA codes are 3-letter airport \
             codes in uppercase.",
            stage = stage_wire_name(stage),
            directive = stage.directive(),
            snapshot = snapshot,
        )
    }
}

fn stage_wire_name(stage: ConversationStage) -> String {
    serde_json::to_string(&stage)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_the_stage_directive() {
        let prompt = PromptBuilder::new()
            .system_prompt(ConversationStage::CollectingBudget, &CollectedTravelData::default());

        assert!(prompt.contains("collecting_budget"));
        assert!(prompt.contains(ConversationStage::CollectingBudget.directive()));
    }

    #[test]
    fn embeds_the_data_snapshot() {
        let data = CollectedTravelData {
            origin_name: Some("São Paulo".to_string()),
            origin_iata: Some("GRU".to_string()),
            ..Default::default()
        };

        let prompt =
            PromptBuilder::new().system_prompt(ConversationStage::CollectingBudget, &data);

        assert!(prompt.contains("São Paulo"));
        assert!(prompt.contains("GRU"));
    }

    #[test]
    fn carries_the_copy_forward_instruction() {
        let prompt = PromptBuilder::new()
            .system_prompt(ConversationStage::CollectingOrigin, &CollectedTravelData::default());

        assert!(prompt.contains("Never set a previously collected field back to null"));
    }

    #[test]
    fn describes_the_wire_contract() {
        let prompt = PromptBuilder::new()
            .system_prompt(ConversationStage::CollectingOrigin, &CollectedTravelData::default());

        for key in [
            "conversation_stage",
            "data_collected",
            "assistant_message",
            "is_final_recommendation",
            "next_question_key",
        ] {
            assert!(prompt.contains(key), "prompt should mention {key}");
        }
    }
}
