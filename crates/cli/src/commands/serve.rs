//! Serve command handler.

use super::build_service;
use crate::server::{self, AppState};
use clap::Args;
use schoolbot_core::{config::AppConfig, AppResult};
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or(config.server.port);

        let service = Arc::new(build_service(config)?);
        let summary = service.knowledge().summary();
        tracing::info!(
            loaded = summary.loaded,
            sections = summary.sections.len(),
            school = %config.school_name,
            "Answer service ready"
        );

        server::serve(AppState { service }, host, port).await
    }
}
