//! Ask command handler.
//!
//! Runs one question through the answer pipeline and prints the result.

use super::build_service;
use clap::Args;
use schoolbot_core::{config::AppConfig, AppError, AppResult};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output the full answer with source and metadata as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let service = build_service(config)?;
        let answer = service.answer(question).await;

        if self.json {
            let json = serde_json::to_string_pretty(&answer)?;
            println!("{}", json);
        } else {
            println!("{}", answer.answer);
            tracing::debug!(source = answer.source.as_str(), "Answer source");
        }

        Ok(())
    }
}
