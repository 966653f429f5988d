//! Configuration management for the school assistant.
//!
//! Configuration is merged from several sources, later sources winning:
//! - Built-in defaults
//! - A YAML config file (`SCHOOLBOT_CONFIG` or `--config`)
//! - Environment variables (a `.env` file is loaded by the binary beforehand)
//! - Command-line flags
//!
//! Everything is enumerated once at startup and passed down by reference.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// System prompt sent ahead of every generation request.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Kamu asisten jurusan RPL SMKN 4 Bojonegoro. Jawab singkat dan jelas berdasarkan data.";

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 4] = ["groq", "openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Path to the school knowledge JSON document
    pub data_path: PathBuf,

    /// School display name used in direct answers
    pub school_name: String,

    /// Directory holding prompt template overrides (`<id>.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub llm: LlmSettings,
    pub cache: CacheSettings,
    pub retrieval: RetrievalSettings,
    pub answer: AnswerSettings,
    pub server: ServerSettings,
}

/// Text-generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider identifier ("groq", "openai", "ollama", "mock")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom endpoint; each provider has its own default
    pub endpoint: Option<String>,

    /// API key for hosted providers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            endpoint: None,
            api_key: None,
            temperature: 0.3,
            max_tokens: 150,
            timeout_secs: 10,
            max_retries: 2,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,

    /// Entry time-to-live in seconds
    pub ttl_secs: u64,

    /// Optional size bound; `None` keeps the cache unbounded
    pub max_entries: Option<usize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_entries: None,
        }
    }
}

/// Keyword retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Maximum characters of context sent to the model
    pub max_context_length: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_context_length: 500,
        }
    }
}

/// What the orchestrator does when no keyword rule resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoContextPolicy {
    /// Ask the model anyway, relying on general knowledge
    #[default]
    General,

    /// Answer with a fixed "no information" message
    Fallback,
}

impl NoContextPolicy {
    /// Parse a policy name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "general" | "llm" => Some(Self::General),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

/// Answer pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    pub system_prompt: String,
    pub no_context_policy: NoContextPolicy,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            no_context_policy: NoContextPolicy::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    data_path: Option<PathBuf>,
    school_name: Option<String>,
    prompts_dir: Option<PathBuf>,
    logging: Option<LoggingConfig>,
    llm: Option<LlmSettings>,
    cache: Option<CacheSettings>,
    retrieval: Option<RetrievalSettings>,
    answer: Option<AnswerSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            data_path: PathBuf::from("data/info_sekolah.json"),
            school_name: "SMKN 4 Bojonegoro".to_string(),
            prompts_dir: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: LlmSettings::default(),
            cache: CacheSettings::default(),
            retrieval: RetrievalSettings::default(),
            answer: AnswerSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and defaults.
    ///
    /// Environment variables:
    /// - `SCHOOLBOT_CONFIG`: Path to YAML config file
    /// - `SCHOOLBOT_DATA`: Knowledge JSON path
    /// - `SCHOOLBOT_SCHOOL_NAME`: School display name
    /// - `SCHOOLBOT_PROVIDER` / `SCHOOLBOT_MODEL` / `SCHOOLBOT_ENDPOINT`
    /// - `SCHOOLBOT_API_KEY`, falling back to `GROQ_API_KEY` then `OPENAI_API_KEY`
    /// - `SCHOOLBOT_CACHE_ENABLED` / `SCHOOLBOT_CACHE_TTL`
    /// - `SCHOOLBOT_NO_CONTEXT_POLICY`: `general` or `fallback`
    /// - `SCHOOLBOT_HOST` / `PORT`
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use schoolbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Data: {:?}", config.data_path);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `env` as the variable source.
    pub fn load_with<F>(env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(config_file) = env("SCHOOLBOT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if let Some(path) = config.config_file.clone() {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            config = config.merge_yaml(&path)?;
        }

        config.apply_env(env)?;
        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env<F>(&mut self, env: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data) = env("SCHOOLBOT_DATA") {
            self.data_path = PathBuf::from(data);
        }

        if let Some(name) = env("SCHOOLBOT_SCHOOL_NAME") {
            self.school_name = name;
        }

        if let Some(provider) = env("SCHOOLBOT_PROVIDER") {
            self.llm.provider = provider;
        }

        if let Some(model) = env("SCHOOLBOT_MODEL") {
            self.llm.model = model;
        }

        if let Some(endpoint) = env("SCHOOLBOT_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }

        if let Some(key) = env("SCHOOLBOT_API_KEY")
            .or_else(|| env("GROQ_API_KEY"))
            .or_else(|| env("OPENAI_API_KEY"))
        {
            self.llm.api_key = Some(key);
        }

        if let Some(enabled) = env("SCHOOLBOT_CACHE_ENABLED") {
            self.cache.enabled = parse_bool(&enabled).ok_or_else(|| {
                AppError::Config(format!("Invalid SCHOOLBOT_CACHE_ENABLED: {}", enabled))
            })?;
        }

        if let Some(ttl) = env("SCHOOLBOT_CACHE_TTL") {
            self.cache.ttl_secs = ttl
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SCHOOLBOT_CACHE_TTL: {}", e)))?;
        }

        if let Some(policy) = env("SCHOOLBOT_NO_CONTEXT_POLICY") {
            self.answer.no_context_policy = NoContextPolicy::parse(&policy).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid SCHOOLBOT_NO_CONTEXT_POLICY: {} (expected general or fallback)",
                    policy
                ))
            })?;
        }

        if let Some(host) = env("SCHOOLBOT_HOST") {
            self.server.host = host;
        }

        if let Some(port) = env("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid PORT: {}", e)))?;
        }

        if let Some(level) = env("RUST_LOG") {
            self.log_level = Some(level);
        }

        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(data_path) = config_file.data_path {
            result.data_path = data_path;
        }

        if let Some(school_name) = config_file.school_name {
            result.school_name = school_name;
        }

        if let Some(prompts_dir) = config_file.prompts_dir {
            result.prompts_dir = Some(prompts_dir);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(cache) = config_file.cache {
            result.cache = cache;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(answer) = config_file.answer {
            result.answer = answer;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_path: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(data_path) = data_path {
            self.data_path = data_path;
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Whether the configured provider needs an API key.
    pub fn provider_requires_key(&self) -> bool {
        matches!(self.llm.provider.to_lowercase().as_str(), "groq" | "openai")
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.provider_requires_key() && self.llm.api_key.is_none() {
            return Err(AppError::Config(format!(
                "Provider '{}' requires an API key (set SCHOOLBOT_API_KEY or GROQ_API_KEY)",
                self.llm.provider
            )));
        }

        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(AppError::Config(
                "cache.ttl_secs must be greater than zero when caching is enabled".to_string(),
            ));
        }

        if self.cache.max_entries == Some(0) {
            return Err(AppError::Config(
                "cache.max_entries must be greater than zero when set".to_string(),
            ));
        }

        if self.retrieval.max_context_length == 0 {
            return Err(AppError::Config(
                "retrieval.max_context_length must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
