//! Anthropic adapter for the model client port.
//!
//! Streams completions from the messages API via SSE. Only the streaming
//! path exists: the discovery pipeline always drains the full stream before
//! parsing, and non-streaming responses offer nothing extra here.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let client = AnthropicModelClient::new(config);
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{ModelClient, ModelError, ModelInfo, ModelRequest, TextStream, TurnRole};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic messages-API client.
pub struct AnthropicModelClient {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicModelClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::InvalidRequest(format!("http client: {e}")))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn to_wire_request(&self, request: &ModelRequest) -> WireRequest {
        let messages = request
            .messages
            .iter()
            .map(|turn| WireMessage {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "assistant",
                },
                content: turn.content.clone(),
            })
            .collect();

        WireRequest {
            model: self.config.model.clone(),
            messages,
            system: Some(request.system_prompt.clone()),
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            stream: true,
        }
    }

    async fn send_streaming_request(&self, request: &ModelRequest) -> Result<Response, ModelError> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.to_wire_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    ModelError::Network(format!("connection failed: {e}"))
                } else {
                    ModelError::Network(e.to_string())
                }
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, ModelError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(ModelError::AuthenticationFailed),
            429 => Err(ModelError::RateLimited {
                retry_after_secs: 60,
            }),
            400 => Err(ModelError::InvalidRequest(error_body)),
            500..=599 => Err(ModelError::Unavailable(format!(
                "server error {status}: {error_body}"
            ))),
            _ => Err(ModelError::Network(format!(
                "unexpected status {status}: {error_body}"
            ))),
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicModelClient {
    async fn stream_invoke(&self, request: ModelRequest) -> Result<TextStream, ModelError> {
        let response = self.send_streaming_request(&request).await?;
        let response = self.handle_response_status(response).await?;

        // SSE arrives as arbitrary byte chunks; buffer per line and track
        // the current event name across chunk boundaries.
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ModelError::Network(format!("stream error: {e}"))))
            .scan(SseState::default(), |state, chunk| {
                let events = match chunk {
                    Ok(bytes) => state.feed(&String::from_utf8_lossy(&bytes)),
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(events))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo::new("anthropic", &self.config.model)
    }
}

/// Line buffer and event tracker for the SSE stream.
#[derive(Debug, Default)]
struct SseState {
    buffer: String,
    current_event: String,
}

impl SseState {
    /// Feeds raw text in, yields text deltas (or errors) for every complete
    /// line now available.
    fn feed(&mut self, text: &str) -> Vec<Result<String, ModelError>> {
        self.buffer.push_str(text);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end();

            if let Some(event) = line.strip_prefix("event: ") {
                self.current_event = event.to_string();
            } else if let Some(data) = line.strip_prefix("data: ") {
                if let Some(item) = parse_sse_data(&self.current_event, data) {
                    out.push(item);
                }
            }
        }
        out
    }
}

/// Interprets one `data:` payload under the current event name.
fn parse_sse_data(event: &str, data: &str) -> Option<Result<String, ModelError>> {
    match event {
        "content_block_delta" => {
            let delta: ContentBlockDelta = serde_json::from_str(data).ok()?;
            let text = delta.delta.text?;
            if text.is_empty() {
                None
            } else {
                Some(Ok(text))
            }
        }
        "error" => {
            let message = serde_json::from_str::<SseError>(data)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| data.to_string());
            Some(Err(ModelError::Unavailable(message)))
        }
        // message_start, message_delta, message_stop, ping: nothing to emit
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: DeltaText,
}

#[derive(Debug, Deserialize)]
struct DeltaText {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseError {
    error: SseErrorBody,
}

#[derive(Debug, Deserialize)]
struct SseErrorBody {
    message: String,
}
