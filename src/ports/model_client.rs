//! Model invocation port.
//!
//! Abstracts the LLM behind a streaming text interface. The application
//! layer always drains the full stream before parsing — partial output must
//! never reach the parser — but the port stays streaming so adapters can
//! surface progress elsewhere.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Stream of raw text chunks from one model invocation.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// Role of a conversation turn sent to the model.
///
/// System instructions travel separately as the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One conversation turn in the request history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request for one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// System prompt guiding the model.
    pub system_prompt: String,
    /// Conversation history, oldest first, ending with the user's message.
    pub messages: Vec<ChatTurn>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ModelRequest {
    /// Creates a request with conservative generation defaults.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            max_tokens: 1024,
            temperature: 0.3,
        }
    }

    /// Appends a conversation turn.
    pub fn with_message(mut self, turn: ChatTurn) -> Self {
        self.messages.push(turn);
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Identity of the model behind the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Provider name (e.g. "anthropic", "mock").
    pub provider: String,
    /// Model identifier.
    pub model: String,
}

impl ModelInfo {
    /// Creates model info.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// Model invocation failures.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// Provider is down or overloaded.
    #[error("model unavailable: {0}")]
    Unavailable(String),

    /// Network failure during the request.
    #[error("network error: {0}")]
    Network(String),

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The request itself was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider's response could not be decoded.
    #[error("response decode error: {0}")]
    Decode(String),
}

impl ModelError {
    /// True when a retry could plausibly succeed.
    ///
    /// Retries remain caller policy; the core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::RateLimited { .. }
                | ModelError::Timeout { .. }
                | ModelError::Unavailable(_)
                | ModelError::Network(_)
        )
    }
}

/// Port for invoking the model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Invokes the model, returning its output as a chunk stream.
    async fn stream_invoke(&self, request: ModelRequest) -> Result<TextStream, ModelError>;

    /// Identifies the model behind this client.
    fn model_info(&self) -> ModelInfo;
}
