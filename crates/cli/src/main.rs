//! School assistant CLI
//!
//! Main entry point for the `schoolbot` binary: serves the question-answering
//! API or answers a single question from the command line.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand};
use schoolbot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// School assistant - answers questions about the school from local data
#[derive(Parser, Debug)]
#[command(name = "schoolbot")]
#[command(about = "Hybrid question answering about a school", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "SCHOOLBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the school data JSON file
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// LLM provider (groq, openai, ollama, mock)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Ask a single question
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load .env before anything reads the environment; reported once logging is up
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // The --config flag stands in for SCHOOLBOT_CONFIG
    let config_file = cli.config.clone();
    let config = AppConfig::load_with(|key| match (key, &config_file) {
        ("SCHOOLBOT_CONFIG", Some(path)) => Some(path.display().to_string()),
        _ => std::env::var(key).ok(),
    })?;

    let config = config.with_overrides(
        cli.data,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.log_json,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    if let Err(e) = dotenv {
        tracing::debug!(".env not loaded: {} (using system environment)", e);
    }

    tracing::info!("School assistant starting");
    tracing::debug!("Data: {:?}", config.data_path);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
