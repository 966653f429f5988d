//! Command handlers for the school assistant CLI.

pub mod ask;
pub mod serve;

pub use ask::AskCommand;
pub use serve::ServeCommand;

use schoolbot_answer::AnswerService;
use schoolbot_core::{config::AppConfig, AppError, AppResult};
use schoolbot_llm::create_client;

/// Build the answer service for the configured provider.
pub(crate) fn build_service(config: &AppConfig) -> AppResult<AnswerService> {
    let client = create_client(
        &config.llm.provider,
        config.llm.endpoint.as_deref(),
        config.llm.api_key.as_deref(),
    )
    .map_err(|e| AppError::Config(e.to_string()))?;

    tracing::debug!(
        provider = client.provider_name(),
        model = %config.llm.model,
        "LLM client ready"
    );

    AnswerService::from_config(config, client)
}
