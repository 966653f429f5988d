//! Provider error taxonomy.
//!
//! Providers report failures as `LlmError` instead of opaque strings so the
//! gateway can decide between retrying, reporting a rate limit, and giving up.

use schoolbot_core::AppError;
use thiserror::Error;

/// Failure reported by an `LlmClient`.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Provider refused the request because of quota or request rate
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Attempt exceeded the configured deadline
    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    /// Connection-level failure (DNS, TLS, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the provider
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider is missing required settings
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Build an error from an HTTP status and body, recognising rate limits.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 || mentions_rate_limit(&message) {
            Self::RateLimited(message)
        } else {
            Self::Api { status, message }
        }
    }

    /// Whether this failure means the provider is throttling us.
    ///
    /// Providers are inconsistent about how they signal throttling, so besides
    /// the dedicated variant any message carrying `rate_limit_exceeded` or a
    /// `429` status code counts.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Api { status, message } => *status == 429 || mentions_rate_limit(message),
            Self::Transport(message) | Self::InvalidResponse(message) => {
                mentions_rate_limit(message)
            }
            Self::Timeout(_) | Self::NotConfigured(_) => false,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::RateLimited(_) | Self::InvalidResponse(_) | Self::NotConfigured(_) => false,
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    message.to_lowercase().contains("rate_limit_exceeded") || message.contains("429")
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(0);
        }
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None if err.is_decode() => Self::InvalidResponse(err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}
