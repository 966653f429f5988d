//! LLM integration crate for the school assistant.
//!
//! This crate provides a provider-agnostic abstraction for calling hosted
//! or local text-generation models, and the [`LlmGateway`] that the answer
//! pipeline goes through.
//!
//! # Providers
//! - **Groq** (default) and **OpenAI** via the chat completions API
//! - **Ollama**: local LLM runtime
//! - **Mock**: canned replies for offline use and tests
//!
//! # Example
//! ```no_run
//! use schoolbot_llm::{create_client, FailureMessages, GatewaySettings, LlmGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("groq", None, Some("gsk-..."))?;
//! let gateway = LlmGateway::new(client, GatewaySettings::default());
//! let answer = gateway.answer("Apa visi sekolah?", &FailureMessages::default()).await;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod gateway;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use error::LlmError;
pub use factory::create_client;
pub use gateway::{
    FailureMessages, GatewayOutcome, GatewaySettings, LlmGateway, GENERIC_FAILURE_MESSAGE,
    RATE_LIMIT_MESSAGE,
};
pub use providers::{MockClient, OllamaClient, OpenAiCompatClient};
pub use types::ProviderType;
