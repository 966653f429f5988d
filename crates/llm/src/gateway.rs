//! LLM gateway: the only path from the answer pipeline to a provider.
//!
//! The gateway applies the fixed generation parameters, a per-attempt
//! timeout and a small retry budget, then reduces whatever happened to a
//! [`GatewayOutcome`]. Turning an outcome into user-facing text is a pure
//! function ([`GatewayOutcome::into_answer`]), so callers always get a string
//! and never see a transport error.

use crate::client::{LlmClient, LlmRequest};
use crate::error::LlmError;
use schoolbot_core::config::LlmSettings;
use std::sync::Arc;
use std::time::Duration;

/// Shown when the provider is throttling requests.
pub const RATE_LIMIT_MESSAGE: &str =
    "Maaf, batas penggunaan API tercapai. Silakan coba lagi nanti.";

/// Shown for any other provider failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Maaf, terjadi kesalahan saat memproses pertanyaan.";

/// Fixed generation parameters applied to every request.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Additional attempts after the first for transient failures
    pub max_retries: u32,
}

impl From<&LlmSettings> for GatewaySettings {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from(&LlmSettings::default())
    }
}

/// User-facing replacements for failed generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessages {
    pub rate_limited: String,
    pub failure: String,
}

impl FailureMessages {
    /// Messages with a custom text for non-rate-limit failures.
    pub fn with_failure(failure: impl Into<String>) -> Self {
        Self {
            failure: failure.into(),
            ..Self::default()
        }
    }
}

impl Default for FailureMessages {
    fn default() -> Self {
        Self {
            rate_limited: RATE_LIMIT_MESSAGE.to_string(),
            failure: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Result of a gateway invocation after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// Trimmed generated text
    Answer(String),
    /// Provider signalled throttling
    RateLimited,
    /// Retry budget exhausted on timeouts, connection or 5xx errors
    TransientFailure(String),
    /// Failure that retrying cannot fix
    Fatal(String),
}

impl GatewayOutcome {
    /// Classify the result of a single attempt.
    pub fn classify(result: Result<String, LlmError>) -> Self {
        match result {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Self::Fatal("provider returned an empty completion".to_string())
                } else {
                    Self::Answer(trimmed.to_string())
                }
            }
            Err(err) if err.is_rate_limit() => Self::RateLimited,
            Err(err) if err.is_transient() => Self::TransientFailure(err.to_string()),
            Err(err) => Self::Fatal(err.to_string()),
        }
    }

    /// Reduce the outcome to the text shown to the user.
    pub fn into_answer(self, messages: &FailureMessages) -> String {
        match self {
            Self::Answer(text) => text,
            Self::RateLimited => messages.rate_limited.clone(),
            Self::TransientFailure(_) | Self::Fatal(_) => messages.failure.clone(),
        }
    }
}

/// Wraps an `LlmClient` with timeout, retries and failure classification.
pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    settings: GatewaySettings,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, settings: GatewaySettings) -> Self {
        Self { client, settings }
    }

    /// Send a fully assembled prompt and classify the result.
    ///
    /// Transient failures are retried up to `max_retries` times; rate limits
    /// and fatal errors end the attempt loop immediately.
    pub async fn invoke(&self, prompt: &str) -> GatewayOutcome {
        let request = LlmRequest::new(prompt, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let attempts = self.settings.max_retries + 1;
        let mut outcome = GatewayOutcome::Fatal("no attempt made".to_string());

        for attempt in 1..=attempts {
            let result = match tokio::time::timeout(
                self.settings.timeout,
                self.client.complete(&request),
            )
            .await
            {
                Ok(result) => result.map(|response| response.content),
                Err(_) => Err(LlmError::Timeout(self.settings.timeout.as_secs())),
            };

            outcome = GatewayOutcome::classify(result);
            match &outcome {
                GatewayOutcome::Answer(_) => {
                    tracing::debug!(
                        provider = self.client.provider_name(),
                        attempt,
                        "Generation succeeded"
                    );
                    break;
                }
                GatewayOutcome::TransientFailure(reason) if attempt < attempts => {
                    tracing::warn!(
                        provider = self.client.provider_name(),
                        attempt,
                        %reason,
                        "Transient generation failure, retrying"
                    );
                }
                GatewayOutcome::RateLimited => {
                    tracing::warn!(
                        provider = self.client.provider_name(),
                        "Provider rate limit hit"
                    );
                    break;
                }
                GatewayOutcome::TransientFailure(reason) | GatewayOutcome::Fatal(reason) => {
                    tracing::error!(
                        provider = self.client.provider_name(),
                        attempt,
                        %reason,
                        "Generation failed"
                    );
                    break;
                }
            }
        }

        outcome
    }

    /// Send a prompt and always come back with user-facing text.
    pub async fn answer(&self, prompt: &str, messages: &FailureMessages) -> String {
        self.invoke(prompt).await.into_answer(messages)
    }
}
