//! Chat session aggregate.
//!
//! A session owns one traveler interview: the transcript, the accumulated
//! travel data, and the canonical stage. It is mutated exactly once per
//! completed turn — `record_user_message` stages the inbound message in
//! memory and `apply_turn` lands the whole turn at once.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp, UserId, ValidationError};

use super::reply::ModelReply;
use super::stage::ConversationStage;
use super::travel_data::CollectedTravelData;

/// Role of a transcript message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// An immutable transcript entry.
///
/// Assistant messages carry the validated structured reply they were
/// extracted from, when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    timestamp: Timestamp,
    #[serde(default)]
    reply: Option<ModelReply>,
}

impl ChatMessage {
    /// Creates a user message.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if content is blank
    pub fn user(content: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Role::User, content, None)
    }

    /// Creates an assistant message with its structured reply attached.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if content is blank
    pub fn assistant(
        content: impl Into<String>,
        reply: Option<ModelReply>,
    ) -> Result<Self, ValidationError> {
        Self::new(Role::Assistant, content, reply)
    }

    fn new(
        role: Role,
        content: impl Into<String>,
        reply: Option<ModelReply>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        Ok(Self {
            role,
            content,
            timestamp: Timestamp::now(),
            reply,
        })
    }

    /// Returns the sender role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns when the message was recorded.
    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// Returns the attached structured reply, if any.
    pub fn reply(&self) -> Option<&ModelReply> {
        self.reply.as_ref()
    }
}

/// One traveler interview.
///
/// # Invariants
///
/// - `id` and `user_id` never change after creation
/// - collected data only grows (merge is monotonic); the stage only moves
///   through the canonical calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    id: SessionId,
    user_id: UserId,
    messages: Vec<ChatMessage>,
    data: CollectedTravelData,
    stage: ConversationStage,
    is_complete: bool,
    has_recommendation: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ChatSession {
    /// Starts a fresh interview: all fields null, stage `collecting_origin`.
    pub fn start(user_id: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            user_id,
            messages: Vec::new(),
            data: CollectedTravelData::default(),
            stage: ConversationStage::CollectingOrigin,
            is_complete: false,
            has_recommendation: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        user_id: UserId,
        messages: Vec<ChatMessage>,
        data: CollectedTravelData,
        stage: ConversationStage,
        is_complete: bool,
        has_recommendation: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            messages,
            data,
            stage,
            is_complete,
            has_recommendation,
            created_at,
            updated_at,
        }
    }

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the owner's user ID.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the transcript, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the newest `limit` transcript messages, oldest first.
    pub fn recent_messages(&self, limit: usize) -> &[ChatMessage] {
        let skip = self.messages.len().saturating_sub(limit);
        &self.messages[skip..]
    }

    /// Returns the collected data snapshot.
    pub fn data(&self) -> &CollectedTravelData {
        &self.data
    }

    /// Returns the canonical stage.
    pub fn stage(&self) -> ConversationStage {
        self.stage
    }

    /// True once the interview reached a recommendation.
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// True once the model delivered a final recommendation.
    pub fn has_recommendation(&self) -> bool {
        self.has_recommendation
    }

    /// Returns when the session was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns when the session was last updated.
    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Checks whether the given user owns this session.
    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Appends the traveler's message to the transcript.
    ///
    /// In-memory only; nothing is persisted until the turn completes.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the message is blank
    pub fn record_user_message(&mut self, content: impl Into<String>) -> Result<(), ValidationError> {
        let message = ChatMessage::user(content)?;
        self.messages.push(message);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Lands one completed turn: assistant message, merged data, recomputed
    /// stage, and recommendation flags, in a single mutation.
    pub fn apply_turn(
        &mut self,
        assistant_message: impl Into<String>,
        reply: Option<ModelReply>,
        merged_data: CollectedTravelData,
        stage: ConversationStage,
        has_recommendation: bool,
    ) -> Result<(), ValidationError> {
        let message = ChatMessage::assistant(assistant_message, reply)?;
        self.messages.push(message);
        self.data = merged_data;
        self.stage = stage;
        self.has_recommendation = has_recommendation;
        self.is_complete = stage == ConversationStage::RecommendationReady;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("traveler-1").unwrap()
    }

    fn session() -> ChatSession {
        ChatSession::start(owner())
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn starts_empty_at_collecting_origin() {
            let session = session();

            assert_eq!(session.stage(), ConversationStage::CollectingOrigin);
            assert!(session.data().is_empty());
            assert!(session.messages().is_empty());
            assert!(!session.is_complete());
            assert!(!session.has_recommendation());
        }

        #[test]
        fn ownership_check_matches_only_the_owner() {
            let session = session();

            assert!(session.is_owner(&owner()));
            assert!(!session.is_owner(&UserId::new("intruder").unwrap()));
        }

        #[test]
        fn serde_round_trips_the_full_record() {
            let mut session = session();
            session.record_user_message("Quero viajar").unwrap();

            let json = serde_json::to_string(&session).unwrap();
            let restored: ChatSession = serde_json::from_str(&json).unwrap();

            assert_eq!(restored, session);
        }

        #[test]
        fn reconstitute_rebuilds_an_identical_session() {
            let mut session = session();
            session.record_user_message("Quero viajar").unwrap();

            let rebuilt = ChatSession::reconstitute(
                *session.id(),
                session.user_id().clone(),
                session.messages().to_vec(),
                session.data().clone(),
                session.stage(),
                session.is_complete(),
                session.has_recommendation(),
                *session.created_at(),
                *session.updated_at(),
            );

            assert_eq!(rebuilt, session);
        }
    }

    mod transcript {
        use super::*;

        #[test]
        fn user_messages_append_in_order() {
            let mut session = session();
            session.record_user_message("primeira").unwrap();
            session.record_user_message("segunda").unwrap();

            let roles: Vec<Role> = session.messages().iter().map(|m| m.role()).collect();
            assert_eq!(roles, vec![Role::User, Role::User]);
            assert_eq!(session.messages()[1].content(), "segunda");
        }

        #[test]
        fn blank_user_messages_are_rejected() {
            let mut session = session();
            assert!(session.record_user_message("   ").is_err());
            assert!(session.messages().is_empty());
        }

        #[test]
        fn recent_messages_keeps_the_tail() {
            let mut session = session();
            for i in 0..5 {
                session.record_user_message(format!("mensagem {i}")).unwrap();
            }

            let recent = session.recent_messages(2);
            assert_eq!(recent.len(), 2);
            assert_eq!(recent[0].content(), "mensagem 3");
        }

        #[test]
        fn recent_messages_with_large_limit_returns_all() {
            let mut session = session();
            session.record_user_message("oi").unwrap();
            assert_eq!(session.recent_messages(100).len(), 1);
        }
    }

    mod turns {
        use super::*;

        #[test]
        fn apply_turn_lands_everything_at_once() {
            let mut session = session();
            session.record_user_message("São Paulo").unwrap();

            let merged = CollectedTravelData {
                origin_name: Some("São Paulo".to_string()),
                origin_iata: Some("GRU".to_string()),
                ..Default::default()
            };

            session
                .apply_turn(
                    "Qual é o seu orçamento?",
                    Some(ModelReply::fallback("Qual é o seu orçamento?")),
                    merged.clone(),
                    ConversationStage::CollectingBudget,
                    false,
                )
                .unwrap();

            assert_eq!(session.data(), &merged);
            assert_eq!(session.stage(), ConversationStage::CollectingBudget);
            assert_eq!(session.messages().len(), 2);
            assert_eq!(session.messages()[1].role(), Role::Assistant);
            assert!(session.messages()[1].reply().is_some());
        }

        #[test]
        fn reaching_recommendation_marks_the_session_complete() {
            let mut session = session();

            session
                .apply_turn(
                    "Recomendo Salvador!",
                    None,
                    CollectedTravelData::default(),
                    ConversationStage::RecommendationReady,
                    true,
                )
                .unwrap();

            assert!(session.is_complete());
            assert!(session.has_recommendation());
        }

        #[test]
        fn apply_turn_bumps_updated_at() {
            let mut session = session();
            let before = *session.updated_at();

            session
                .apply_turn(
                    "Oi!",
                    None,
                    CollectedTravelData::default(),
                    ConversationStage::CollectingOrigin,
                    false,
                )
                .unwrap();

            assert!(!session.updated_at().is_before(&before));
        }
    }
}
