//! Discovery service - the per-session turn orchestrator.
//!
//! The only component with side effects: it loads and persists sessions,
//! invokes the model, and drives the parse → validate → merge → stage
//! pipeline for each turn. One turn is processed sequentially end-to-end
//! and the session is persisted exactly once per completed turn. Callers
//! must not run concurrent turns for the same session id; the store's
//! last-write-wins semantics apply if they do.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;

use crate::config::DiscoveryConfig;
use crate::domain::discovery::{
    calculate_correct_stage, validate_budget_for_passengers, validate_passenger_composition,
    ChatSession, CollectedTravelData, ConversationStage, FlightParamsError, FlightSearchParams,
    ModelReply, PromptBuilder, ResponseParser, Role, ValidationReport,
};
use crate::domain::foundation::{SessionId, Timestamp, UserId, ValidationError};
use crate::ports::{
    ChatTurn, FlightOffer, FlightSearch, FlightSearchError, ModelClient, ModelError,
    ModelRequest, SessionStore, StoreError,
};

/// Message used when the model's output could not be parsed at all.
const PARSE_FALLBACK_MESSAGE: &str =
    "Sorry, I had trouble processing that. Could you say it again?";

/// What one completed turn hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub stage: ConversationStage,
    pub collected_data: CollectedTravelData,
    pub assistant_message: String,
    pub is_final_recommendation: bool,
}

/// Failures surfaced to the caller.
///
/// Parse and rule failures never appear here — they are recovered into a
/// conversational response. What does surface is unrecoverable: a missing
/// session, a dead store, a failed model invocation.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("storage error: {0}")]
    Store(String),

    #[error("model invocation failed: {0}")]
    Model(#[from] ModelError),

    #[error("message rejected: {0}")]
    InvalidMessage(#[from] ValidationError),

    #[error(transparent)]
    FlightParams(#[from] FlightParamsError),

    #[error("flight search failed: {0}")]
    FlightSearch(#[from] FlightSearchError),
}

impl From<StoreError> for DiscoveryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DiscoveryError::SessionNotFound(id),
            other => DiscoveryError::Store(other.to_string()),
        }
    }
}

/// Orchestrates discovery interviews over the session store, the model, and
/// the flight-search collaborator.
pub struct DiscoveryService {
    store: Arc<dyn SessionStore>,
    model: Arc<dyn ModelClient>,
    flights: Arc<dyn FlightSearch>,
    config: DiscoveryConfig,
    parser: ResponseParser,
    prompts: PromptBuilder,
}

impl DiscoveryService {
    /// Creates a service over the given collaborators.
    pub fn new(
        store: Arc<dyn SessionStore>,
        model: Arc<dyn ModelClient>,
        flights: Arc<dyn FlightSearch>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            model,
            flights,
            config,
            parser: ResponseParser::new(),
            prompts: PromptBuilder::new(),
        }
    }

    /// Starts or resumes an interview.
    ///
    /// An existing session is reused only when the caller owns it; on an
    /// ownership mismatch a fresh session is silently allocated instead.
    pub async fn start_session(
        &self,
        user_id: UserId,
        existing: Option<SessionId>,
    ) -> Result<SessionId, DiscoveryError> {
        if let Some(id) = existing {
            if let Some(session) = self.store.get(&id).await? {
                if session.is_owner(&user_id) {
                    tracing::debug!(session_id = %id, "resuming existing session");
                    return Ok(id);
                }
                tracing::warn!(session_id = %id, "session owner mismatch, allocating fresh");
            }
        }

        let session = ChatSession::start(user_id);
        let id = *session.id();
        self.store.save(&session).await?;
        tracing::debug!(session_id = %id, "started new session");
        Ok(id)
    }

    /// Processes one traveler message through the full turn pipeline.
    pub async fn process_message(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Result<TurnOutcome, DiscoveryError> {
        let mut session = self.load(session_id).await?;
        session.record_user_message(user_text)?;

        let raw = self.invoke_model(&session).await?;

        let reply = match self.parser.parse(&raw) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(session_id = %session_id, %err, "model reply unrecoverable");
                let data = session.data().clone();
                let stage = session.stage();
                let has_recommendation = session.has_recommendation();
                return self
                    .complete_turn(
                        session,
                        PARSE_FALLBACK_MESSAGE.to_string(),
                        None,
                        data,
                        stage,
                        has_recommendation,
                    )
                    .await;
            }
        };

        // reject an invalid composition before it can reach the merge
        if reply.data_collected.passenger_composition.is_some() {
            let report =
                validate_passenger_composition(reply.data_collected.passenger_composition.as_ref());
            if !report.is_valid() {
                tracing::debug!(session_id = %session_id, ?report, "passenger composition rejected");
                return self.passenger_correction(session, reply, report).await;
            }
        }

        let merged = session.data().merge(&reply.data_collected);

        // with both budget and travelers known, make sure the money covers
        // everyone before moving on
        if merged.has_budget() {
            if let Some(composition) = merged.passenger_composition.clone() {
                let budget = merged.budget_in_brl.unwrap_or_default();
                let report = validate_budget_for_passengers(
                    budget,
                    &composition,
                    self.config.min_budget_per_paying_passenger,
                );
                if !report.is_valid() {
                    tracing::debug!(session_id = %session_id, ?report, "budget rejected");
                    return self.budget_correction(session, merged, report).await;
                }
            }
        }

        let stage = calculate_correct_stage(&merged, reply.is_final_recommendation);
        let message = reply.assistant_message.clone();
        let is_final = reply.is_final_recommendation;

        self.complete_turn(session, message, Some(reply), merged, stage, is_final)
            .await
    }

    /// Ends the interview: returns the final snapshot and deletes the record.
    pub async fn end_session(
        &self,
        session_id: &SessionId,
    ) -> Result<CollectedTravelData, DiscoveryError> {
        let session = self.load(session_id).await?;
        let data = session.data().clone();
        self.store.delete(session_id).await?;
        tracing::debug!(session_id = %session_id, "session ended");
        Ok(data)
    }

    /// Derives flight-search parameters from the session's current data.
    ///
    /// `None` while either IATA code is still missing.
    pub async fn flight_search_params(
        &self,
        session_id: &SessionId,
        trip_duration_days: u32,
    ) -> Result<Option<FlightSearchParams>, DiscoveryError> {
        let session = self.load(session_id).await?;
        let today = Timestamp::now().date_naive();
        Ok(FlightSearchParams::from_collected(
            session.data(),
            trip_duration_days,
            today,
        )?)
    }

    /// Searches flights for a finished interview.
    ///
    /// `None` while the session cannot produce search parameters yet.
    pub async fn search_flights(
        &self,
        session_id: &SessionId,
        trip_duration_days: u32,
    ) -> Result<Option<Vec<FlightOffer>>, DiscoveryError> {
        match self
            .flight_search_params(session_id, trip_duration_days)
            .await?
        {
            Some(params) => Ok(Some(self.flights.search(&params).await?)),
            None => Ok(None),
        }
    }

    async fn load(&self, session_id: &SessionId) -> Result<ChatSession, DiscoveryError> {
        self.store
            .get(session_id)
            .await?
            .ok_or(DiscoveryError::SessionNotFound(*session_id))
    }

    /// Buffers the model's full streamed output before anything downstream
    /// runs; partial output must never reach the parser.
    async fn invoke_model(&self, session: &ChatSession) -> Result<String, DiscoveryError> {
        let system_prompt = self.prompts.system_prompt(session.stage(), session.data());

        let mut request = ModelRequest::new(system_prompt);
        for message in session.recent_messages(self.config.max_history_messages) {
            let turn = match message.role() {
                Role::User => ChatTurn::user(message.content()),
                Role::Assistant => ChatTurn::assistant(message.content()),
                Role::System => continue,
            };
            request = request.with_message(turn);
        }

        let mut stream = self.model.stream_invoke(request).await?;
        let mut buffer = String::new();
        while let Some(chunk) = stream.next().await {
            buffer.push_str(&chunk?);
        }

        tracing::debug!(bytes = buffer.len(), "model stream drained");
        Ok(buffer)
    }

    /// Rejected composition: stay on the passengers stage, keep every other
    /// field the model returned, and never persist the offending value.
    async fn passenger_correction(
        &self,
        session: ChatSession,
        reply: ModelReply,
        report: ValidationReport,
    ) -> Result<TurnOutcome, DiscoveryError> {
        let mut incoming = reply.data_collected.clone();
        incoming.passenger_composition = None;
        let merged = session.data().merge(&incoming);

        let message = format!(
            "Let's adjust the travelers: {}. Who is coming on this trip?",
            report.messages().join("; ")
        );

        self.complete_turn(
            session,
            message,
            Some(reply),
            merged,
            ConversationStage::CollectingPassengers,
            false,
        )
        .await
    }

    /// Rejected budget: clear it, force the stage back, and re-ask.
    async fn budget_correction(
        &self,
        session: ChatSession,
        merged: CollectedTravelData,
        report: ValidationReport,
    ) -> Result<TurnOutcome, DiscoveryError> {
        let mut corrected = merged;
        corrected.budget_in_brl = None;

        let message = format!(
            "That budget looks too tight: {}. What total budget can you work with?",
            report.messages().join("; ")
        );

        self.complete_turn(
            session,
            message,
            None,
            corrected,
            ConversationStage::CollectingBudget,
            false,
        )
        .await
    }

    /// Lands the turn on the session and persists it as one atomic update.
    async fn complete_turn(
        &self,
        mut session: ChatSession,
        assistant_message: String,
        reply: Option<ModelReply>,
        merged: CollectedTravelData,
        stage: ConversationStage,
        is_final: bool,
    ) -> Result<TurnOutcome, DiscoveryError> {
        session.apply_turn(assistant_message.clone(), reply, merged.clone(), stage, is_final)?;
        self.store.save(&session).await?;

        Ok(TurnOutcome {
            stage,
            collected_data: merged,
            assistant_message,
            is_final_recommendation: is_final,
        })
    }
}
