//! Mock provider for offline development and tests.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::error::LlmError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Provider that answers without any network access.
///
/// Scripted results are consumed in order; once the script is exhausted
/// every call returns the default reply. Every request is recorded so tests
/// can assert on how often, and with which prompt, the model was invoked.
#[derive(Debug)]
pub struct MockClient {
    default_reply: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockClient {
    /// Create a mock that always replies with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Queue results returned before falling back to the default reply.
    pub fn with_script(self, results: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(results);
        self
    }

    /// Sleep for `delay` before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completion attempts received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("Ini adalah jawaban contoh dari model tiruan.")
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let content = match next {
            Some(result) => result?,
            None => self.default_reply.clone(),
        };

        Ok(LlmResponse {
            usage: LlmUsage::new(
                request.prompt.split_whitespace().count() as u32,
                content.split_whitespace().count() as u32,
            ),
            content,
            model: request.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_default() {
        let client = MockClient::new("default").with_script([
            Ok("first".to_string()),
            Err(LlmError::RateLimited("429".to_string())),
        ]);
        let request = LlmRequest::new("halo", "mock-model");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert!(client.complete(&request).await.is_err());
        assert_eq!(client.complete(&request).await.unwrap().content, "default");
        assert_eq!(client.calls(), 3);
        assert_eq!(client.last_request().unwrap().prompt, "halo");
    }
}
