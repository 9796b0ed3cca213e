//! Mock model client for testing.
//!
//! Scripted replies are consumed in order and streamed back in configurable
//! chunk sizes, with optional latency and error injection.
//!
//! # Example
//!
//! ```ignore
//! let model = MockModelClient::new()
//!     .with_reply(r#"{"conversation_stage": "collecting_budget", ...}"#)
//!     .with_chunk_size(8);
//! ```

use async_trait::async_trait;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{ModelClient, ModelError, ModelInfo, ModelRequest, TextStream};

enum MockReply {
    Text(String),
    Error(ModelError),
}

/// Mock model client with scripted replies.
#[derive(Clone)]
pub struct MockModelClient {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<ModelRequest>>>,
    chunk_size: usize,
    delay: Duration,
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelClient {
    /// Creates a mock with no scripted replies.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            chunk_size: 16,
            delay: Duration::ZERO,
        }
    }

    /// Queues a reply to stream back.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Text(text.into()));
        self
    }

    /// Queues an error to return instead of a reply.
    pub fn with_error(self, error: ModelError) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Error(error));
        self
    }

    /// Sets how many characters each streamed chunk carries.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets simulated latency per invocation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn stream_invoke(&self, request: ModelRequest) -> Result<TextStream, ModelError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.calls.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text(text)) => {
                let chunks: Vec<Result<String, ModelError>> = text
                    .chars()
                    .collect::<Vec<_>>()
                    .chunks(self.chunk_size)
                    .map(|c| Ok(c.iter().collect()))
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Some(MockReply::Error(error)) => Err(error),
            None => Err(ModelError::Unavailable(
                "mock reply queue is empty".to_string(),
            )),
        }
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo::new("mock", "mock-model-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn drain(mut stream: TextStream) -> String {
        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            out.push_str(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn streams_the_scripted_reply_in_chunks() {
        let model = MockModelClient::new()
            .with_reply("uma resposta do modelo")
            .with_chunk_size(4);

        let stream = model
            .stream_invoke(ModelRequest::new("system"))
            .await
            .unwrap();

        assert_eq!(drain(stream).await, "uma resposta do modelo");
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let model = MockModelClient::new()
            .with_reply("primeira")
            .with_reply("segunda");

        let first = model.stream_invoke(ModelRequest::new("s")).await.unwrap();
        assert_eq!(drain(first).await, "primeira");

        let second = model.stream_invoke(ModelRequest::new("s")).await.unwrap();
        assert_eq!(drain(second).await, "segunda");
    }

    #[tokio::test]
    async fn injected_errors_surface() {
        let model = MockModelClient::new().with_error(ModelError::RateLimited {
            retry_after_secs: 30,
        });

        let result = model.stream_invoke(ModelRequest::new("s")).await;
        assert!(matches!(
            result,
            Err(ModelError::RateLimited { retry_after_secs: 30 })
        ));
    }

    #[tokio::test]
    async fn exhausted_queue_is_unavailable() {
        let model = MockModelClient::new();
        let result = model.stream_invoke(ModelRequest::new("s")).await;
        assert!(matches!(result, Err(ModelError::Unavailable(_))));
    }

    #[tokio::test]
    async fn records_the_requests_it_receives() {
        let model = MockModelClient::new().with_reply("ok!");

        let request = ModelRequest::new("system prompt here");
        model.stream_invoke(request.clone()).await.unwrap();

        assert_eq!(model.call_count(), 1);
        assert_eq!(model.calls()[0], request);
    }

    #[test]
    fn identifies_itself_as_mock() {
        let info = MockModelClient::new().model_info();
        assert_eq!(info.provider, "mock");
    }
}
