//! The structured reply contract the model must honor each turn.
//!
//! The model is instructed to answer with a single JSON object carrying the
//! claimed stage, its view of the collected data, the human-readable
//! assistant message, and a final-recommendation flag. Structural validation
//! happens here; trust decisions (discarding the claimed stage, merging the
//! data) happen in the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::stage::ConversationStage;
use super::travel_data::CollectedTravelData;

/// Top-level keys every structured reply must carry.
/// `next_question_key` is optional and defaults to null.
const REQUIRED_FIELDS: [&str; 4] = [
    "conversation_stage",
    "data_collected",
    "assistant_message",
    "is_final_recommendation",
];

/// Sub-fields expected inside `data_collected`. Absent ones are filled with
/// null before deserialization; a reply is never rejected for omitting one.
pub const DATA_FIELDS: [&str; 10] = [
    "origin_name",
    "origin_iata",
    "destination_name",
    "destination_iata",
    "budget_in_brl",
    "activities",
    "hobbies",
    "availability_months",
    "purpose",
    "passenger_composition",
];

/// One validated model turn. Transient: attached to the transcript but never
/// authoritative — the claimed stage is always recomputed from merged data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub conversation_stage: ConversationStage,
    pub data_collected: CollectedTravelData,
    pub assistant_message: String,
    pub is_final_recommendation: bool,
    #[serde(default)]
    pub next_question_key: Option<String>,
}

/// Structural problems with a candidate reply.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReplyValidationError {
    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has the wrong type: expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown conversation stage '{0}'")]
    UnknownStage(String),

    #[error("final recommendation without a destination")]
    RecommendationWithoutDestination,

    #[error("malformed data_collected: {0}")]
    MalformedData(String),
}

impl ModelReply {
    /// Validates a parsed JSON value against the wire contract.
    ///
    /// Missing `data_collected` sub-fields are filled with null rather than
    /// rejected. A reply claiming a final recommendation must name a
    /// destination (both city and IATA code) or it is rejected outright.
    pub fn from_value(value: Value) -> Result<Self, ReplyValidationError> {
        let Value::Object(mut map) = value else {
            return Err(ReplyValidationError::NotAnObject);
        };

        for field in REQUIRED_FIELDS {
            if !map.contains_key(field) {
                return Err(ReplyValidationError::MissingField(field));
            }
        }

        let stage_raw = match map.get("conversation_stage").and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => {
                return Err(ReplyValidationError::WrongType {
                    field: "conversation_stage",
                    expected: "string",
                })
            }
        };
        let conversation_stage: ConversationStage =
            serde_json::from_value(Value::String(stage_raw.clone()))
                .map_err(|_| ReplyValidationError::UnknownStage(stage_raw))?;

        let assistant_message = match map.get("assistant_message").and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => {
                return Err(ReplyValidationError::WrongType {
                    field: "assistant_message",
                    expected: "string",
                })
            }
        };

        let is_final_recommendation =
            match map.get("is_final_recommendation").and_then(Value::as_bool) {
                Some(b) => b,
                None => {
                    return Err(ReplyValidationError::WrongType {
                        field: "is_final_recommendation",
                        expected: "boolean",
                    })
                }
            };

        let next_question_key = map
            .get("next_question_key")
            .and_then(Value::as_str)
            .map(String::from);

        let data_value = map
            .remove("data_collected")
            .unwrap_or(Value::Null);
        let Value::Object(mut data_map) = data_value else {
            return Err(ReplyValidationError::WrongType {
                field: "data_collected",
                expected: "object",
            });
        };
        for field in DATA_FIELDS {
            data_map.entry(field).or_insert(Value::Null);
        }

        match &data_map["budget_in_brl"] {
            Value::Null | Value::Number(_) => {}
            _ => {
                return Err(ReplyValidationError::WrongType {
                    field: "budget_in_brl",
                    expected: "number or null",
                })
            }
        }
        for field in ["activities", "hobbies", "availability_months"] {
            match &data_map[field] {
                Value::Null | Value::Array(_) => {}
                _ => {
                    return Err(ReplyValidationError::WrongType {
                        field,
                        expected: "array or null",
                    })
                }
            }
        }

        let data_collected: CollectedTravelData =
            serde_json::from_value(Value::Object(data_map))
                .map_err(|e| ReplyValidationError::MalformedData(e.to_string()))?;

        if is_final_recommendation && !data_collected.has_destination() {
            return Err(ReplyValidationError::RecommendationWithoutDestination);
        }

        Ok(Self {
            conversation_stage,
            data_collected,
            assistant_message,
            is_final_recommendation,
            next_question_key,
        })
    }

    /// Minimal valid reply used when structure could not be recovered.
    pub fn fallback(message: impl Into<String>) -> Self {
        Self {
            conversation_stage: ConversationStage::CollectingOrigin,
            data_collected: CollectedTravelData::default(),
            assistant_message: message.into(),
            is_final_recommendation: false,
            next_question_key: None,
        }
    }
}
