//! The answer pipeline: direct answer, cache, retrieval, generation.
//!
//! Each question walks `DIRECT → CACHE → RETRIEVE → GENERATE` and stops at the
//! first stage that produces text. Every path ends in an [`Answer`]; provider
//! failures surface only as fixed apology strings.

use crate::cache::{CacheStats, ResponseCache};
use crate::stats::{StatsSnapshot, UsageStats};
use crate::types::{Answer, AnswerMetadata, AnswerSource};
use chrono::{DateTime, Utc};
use schoolbot_core::{AppConfig, AppResult, NoContextPolicy};
use schoolbot_knowledge::KnowledgeBase;
use schoolbot_llm::{
    FailureMessages, GatewaySettings, LlmClient, LlmGateway, GENERIC_FAILURE_MESSAGE,
};
use schoolbot_prompt::{build_prompt, PromptDefinition, PromptLibrary};
use std::collections::HashMap;
use std::sync::Arc;

/// Behavioural settings of the pipeline.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub school_name: String,
    pub system_prompt: String,
    pub no_context_policy: NoContextPolicy,
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            school_name: config.school_name.clone(),
            system_prompt: config.answer.system_prompt.clone(),
            no_context_policy: config.answer.no_context_policy,
        }
    }
}

/// Apology used when the general-knowledge generation fails.
pub fn general_failure_message(school: &str) -> String {
    format!(
        "Maaf, pertanyaan Anda di luar cakupan informasi yang saya miliki tentang {}. \
         Silakan tanyakan tentang profil sekolah, jurusan, fasilitas, atau hal terkait SMK.",
        school
    )
}

/// Fixed reply when no data matches and the fallback policy is active.
pub fn no_information_message(school: &str) -> String {
    format!(
        "Maaf, saya belum memiliki informasi tentang hal tersebut. \
         Silakan tanyakan tentang profil, jurusan, atau fasilitas {}.",
        school
    )
}

/// Orchestrates the answer pipeline. Built once and shared behind an `Arc`.
pub struct AnswerService {
    knowledge: Arc<KnowledgeBase>,
    cache: ResponseCache,
    gateway: LlmGateway,
    prompts: PromptLibrary,
    options: ServiceOptions,
    stats: UsageStats,
    started_at: DateTime<Utc>,
}

impl AnswerService {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        cache: ResponseCache,
        gateway: LlmGateway,
        prompts: PromptLibrary,
        options: ServiceOptions,
    ) -> Self {
        Self {
            knowledge,
            cache,
            gateway,
            prompts,
            options,
            stats: UsageStats::default(),
            started_at: Utc::now(),
        }
    }

    /// Wire the service from configuration around an existing client.
    ///
    /// The knowledge file degrades to an empty document; a broken prompt
    /// override is a startup error.
    pub fn from_config(config: &AppConfig, client: Arc<dyn LlmClient>) -> AppResult<Self> {
        let knowledge = KnowledgeBase::load(
            &config.data_path,
            config.school_name.clone(),
            config.retrieval.max_context_length,
        );
        let prompts = PromptLibrary::load(config.prompts_dir.as_deref())?;
        let gateway = LlmGateway::new(client, GatewaySettings::from(&config.llm));

        Ok(Self::new(
            Arc::new(knowledge),
            ResponseCache::from_settings(&config.cache),
            gateway,
            prompts,
            ServiceOptions::from_config(config),
        ))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Answer a question. Never fails.
    pub async fn answer(&self, question: &str) -> Answer {
        self.stats.record_question();

        if let Some(text) = self.knowledge.direct_answer(question) {
            self.stats.record_direct();
            tracing::info!(source = "direct", "Answered without the model");
            return Answer::new(text, AnswerSource::Direct, AnswerMetadata::direct());
        }

        if let Some(text) = self.cache.get(question) {
            self.stats.record_cache_hit();
            tracing::info!(source = "cache", "Answered from cache");
            return Answer::new(text, AnswerSource::Cache, AnswerMetadata::cache());
        }

        let retrieved = self
            .knowledge
            .retrieve(question)
            .map(|fragment| (fragment.keyword.to_string(), self.knowledge.format(&fragment)));

        match retrieved {
            Some((keyword, context)) => {
                self.generate_with_context(question, &keyword, context)
                    .await
            }
            None => {
                self.stats.record_no_context();
                match self.options.no_context_policy {
                    NoContextPolicy::General => self.generate_general(question).await,
                    NoContextPolicy::Fallback => self.fallback(question),
                }
            }
        }
    }

    async fn generate_with_context(
        &self,
        question: &str,
        keyword: &str,
        context: String,
    ) -> Answer {
        let context_length = context.chars().count();
        tracing::debug!(keyword, context_length, "Generating with school data");
        let metadata = AnswerMetadata::with_context(context_length, keyword);

        let text = match self.render(&self.prompts.context, question, Some(context)) {
            Some(prompt) => {
                self.stats.record_llm_call();
                self.generate(&prompt, &FailureMessages::default()).await
            }
            None => GENERIC_FAILURE_MESSAGE.to_string(),
        };
        self.cache.set(question, &text);

        tracing::info!(source = "llm", keyword, "Answered with school data");
        Answer::new(text, AnswerSource::Llm, metadata)
    }

    async fn generate_general(&self, question: &str) -> Answer {
        tracing::debug!("No school data matched, using general knowledge");
        let messages =
            FailureMessages::with_failure(general_failure_message(&self.options.school_name));

        let text = match self.render(&self.prompts.general, question, None) {
            Some(prompt) => self.generate(&prompt, &messages).await,
            None => messages.failure.clone(),
        };
        self.cache.set(question, &text);

        tracing::info!(source = "llm", "Answered from general knowledge");
        Answer::new(text, AnswerSource::Llm, AnswerMetadata::without_context())
    }

    fn fallback(&self, question: &str) -> Answer {
        let text = no_information_message(&self.options.school_name);
        self.cache.set(question, &text);
        self.stats.record_fallback();

        tracing::info!(source = "fallback", "No school data matched");
        Answer::new(text, AnswerSource::Fallback, AnswerMetadata::fallback())
    }

    async fn generate(&self, prompt: &str, messages: &FailureMessages) -> String {
        self.gateway.invoke(prompt).await.into_answer(messages)
    }

    fn render(
        &self,
        definition: &PromptDefinition,
        question: &str,
        context: Option<String>,
    ) -> Option<String> {
        let mut variables = HashMap::new();
        variables.insert("system".to_string(), self.options.system_prompt.clone());
        variables.insert("question".to_string(), question.to_string());
        variables.insert("school".to_string(), self.options.school_name.clone());

        match build_prompt(definition, variables, context) {
            Ok(built) => Some(built.text),
            Err(e) => {
                tracing::error!(prompt = %definition.id, error = %e, "Prompt rendering failed");
                None
            }
        }
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.started_at)
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
        tracing::info!("Statistics reset");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolbot_knowledge::KnowledgeDocument;
    use schoolbot_llm::{LlmError, MockClient, RATE_LIMIT_MESSAGE};
    use serde_json::json;
    use std::time::Duration;

    const SCHOOL: &str = "SMKN 4 Bojonegoro";

    fn knowledge() -> KnowledgeBase {
        let document = KnowledgeDocument::from_json(json!({
            "profile": {
                "nama": "SMK Negeri 4 Bojonegoro",
                "kepala_sekolah": "Budi",
                "visi": "Unggul dalam teknologi"
            },
            "jurusan": {
                "RPL": {"nama": "Rekayasa Perangkat Lunak"},
                "TKJ": {"nama": "Teknik Komputer dan Jaringan"}
            },
            "fasilitas": {
                "lab": ["Lab RPL", "Lab TKJ"],
                "perpustakaan": "Ada"
            }
        }))
        .unwrap();
        KnowledgeBase::new(document, SCHOOL, 500)
    }

    fn service_with(client: Arc<MockClient>, policy: NoContextPolicy) -> AnswerService {
        service_with_cache(client, policy, ResponseCache::new(Duration::from_secs(3600)))
    }

    fn service_with_cache(
        client: Arc<MockClient>,
        policy: NoContextPolicy,
        cache: ResponseCache,
    ) -> AnswerService {
        let gateway = LlmGateway::new(
            client,
            GatewaySettings {
                timeout: Duration::from_millis(200),
                ..GatewaySettings::default()
            },
        );
        AnswerService::new(
            Arc::new(knowledge()),
            cache,
            gateway,
            PromptLibrary::builtin(),
            ServiceOptions {
                school_name: SCHOOL.to_string(),
                system_prompt: "Kamu asisten sekolah.".to_string(),
                no_context_policy: policy,
            },
        )
    }

    fn service(client: Arc<MockClient>) -> AnswerService {
        service_with(client, NoContextPolicy::General)
    }

    #[tokio::test]
    async fn test_direct_answer_skips_cache_and_model() {
        let client = Arc::new(MockClient::new("tidak dipakai"));
        let svc = service(client.clone());

        let answer = svc.answer("siapa kepala sekolah").await;
        assert_eq!(answer.source, AnswerSource::Direct);
        assert!(answer.answer.contains("Budi"));
        assert_eq!(answer.metadata.tokens_saved, Some("~500"));
        assert_eq!(client.calls(), 0);
        assert_eq!(svc.cache_stats().total_cached, 0);

        let stats = svc.get_stats();
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.direct_answers, 1);
    }

    #[tokio::test]
    async fn test_facility_question_uses_model_then_cache() {
        let client = Arc::new(MockClient::new("Ada lab dan perpustakaan."));
        let svc = service(client.clone());

        let first = svc.answer("apa saja fasilitas").await;
        assert_eq!(first.source, AnswerSource::Llm);
        assert_eq!(first.answer, "Ada lab dan perpustakaan.");
        assert_eq!(first.metadata.matched_keyword.as_deref(), Some("fasilitas"));
        assert_eq!(first.metadata.context_available, Some(true));

        let prompt = client.last_request().unwrap().prompt;
        assert!(prompt.contains("Data sekolah:\nlab: Lab RPL, Lab TKJ | perpustakaan: Ada"));
        assert!(prompt.contains("Pertanyaan: apa saja fasilitas"));
        assert!(prompt.starts_with("Kamu asisten sekolah."));

        let second = svc.answer("  APA SAJA FASILITAS ").await;
        assert_eq!(second.source, AnswerSource::Cache);
        assert_eq!(second.answer, first.answer);
        assert_eq!(client.calls(), 1);

        let stats = svc.get_stats();
        assert_eq!(stats.llm_calls, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_clear_cache_invokes_model_again() {
        let client = Arc::new(MockClient::new("Ada lab."));
        let svc = service(client.clone());

        svc.answer("apa saja fasilitas").await;
        svc.clear_cache();
        let again = svc.answer("apa saja fasilitas").await;

        assert_eq!(again.source, AnswerSource::Llm);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_reaches_model() {
        let client = Arc::new(MockClient::new("Ada lab."));
        let svc = service_with_cache(
            client.clone(),
            NoContextPolicy::General,
            ResponseCache::disabled(),
        );

        let first = svc.answer("apa saja fasilitas").await;
        let second = svc.answer("apa saja fasilitas").await;
        assert_eq!(first.source, AnswerSource::Llm);
        assert_eq!(second.source, AnswerSource::Llm);
        assert_eq!(client.calls(), 2);

        let stats = svc.get_stats();
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.llm_calls, 2);
        assert_eq!(svc.cache_stats().total_cached, 0);
        assert!(!svc.cache_stats().enabled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_questions_keep_counters_consistent() {
        let client = Arc::new(MockClient::new("Ada lab.").with_delay(Duration::from_millis(5)));
        let svc = Arc::new(service(client.clone()));

        let questions = [
            "siapa kepala sekolah",
            "apa saja fasilitas",
            "jelaskan jurusan rpl",
            "kapan pendaftaran dibuka?",
        ];
        let rounds = 8;

        let handles: Vec<_> = (0..rounds)
            .flat_map(|_| questions)
            .map(|question| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.answer(question).await })
            })
            .collect();

        for handle in handles {
            let answer = handle.await.unwrap();
            assert!(!answer.answer.is_empty());
        }

        let total = (rounds * questions.len()) as u64;
        let stats = svc.get_stats();
        assert_eq!(stats.total_questions, total);
        assert_eq!(stats.direct_answers, rounds as u64);
        assert_eq!(
            stats.direct_answers + stats.cache_hits + stats.llm_calls + stats.no_context_found,
            total
        );
        assert_eq!(client.calls() as u64, stats.llm_calls + stats.no_context_found);
        assert_eq!(svc.cache_stats().total_cached, 3);
    }

    #[tokio::test]
    async fn test_no_context_general_policy() {
        let client = Arc::new(MockClient::new("Pendaftaran biasanya dibuka pertengahan tahun."));
        let svc = service(client.clone());

        let answer = svc.answer("kapan pendaftaran dibuka?").await;
        assert_eq!(answer.source, AnswerSource::Llm);
        assert_eq!(answer.metadata.context_available, Some(false));
        assert_eq!(answer.metadata.context_length, Some(0));

        let prompt = client.last_request().unwrap().prompt;
        assert!(!prompt.contains("Data sekolah:"));
        assert!(prompt.contains(SCHOOL));

        let stats = svc.get_stats();
        assert_eq!(stats.no_context_found, 1);
        assert_eq!(stats.llm_calls, 0);

        // Cached like any other generation
        assert_eq!(svc.answer("kapan pendaftaran dibuka?").await.source, AnswerSource::Cache);
    }

    #[tokio::test]
    async fn test_no_context_fallback_policy() {
        let client = Arc::new(MockClient::new("tidak dipakai"));
        let svc = service_with(client.clone(), NoContextPolicy::Fallback);

        let answer = svc.answer("kapan pendaftaran dibuka?").await;
        assert_eq!(answer.source, AnswerSource::Fallback);
        assert_eq!(answer.answer, no_information_message(SCHOOL));
        assert_eq!(client.calls(), 0);

        let stats = svc.get_stats();
        assert_eq!(stats.no_context_found, 1);
        assert_eq!(stats.fallback_answers, 1);

        let again = svc.answer("kapan pendaftaran dibuka?").await;
        assert_eq!(again.source, AnswerSource::Cache);
        assert_eq!(again.answer, answer.answer);
    }

    #[tokio::test]
    async fn test_rate_limit_returns_fixed_message() {
        let client = Arc::new(
            MockClient::new("nanti").with_script([Err(LlmError::from_status(429, "slow down"))]),
        );
        let svc = service(client.clone());

        let answer = svc.answer("apa saja fasilitas").await;
        assert_eq!(answer.source, AnswerSource::Llm);
        assert_eq!(answer.answer, RATE_LIMIT_MESSAGE);
        assert_eq!(client.calls(), 1);

        // The apology is cached like any generated text
        let retry = svc.answer("apa saja fasilitas").await;
        assert_eq!(retry.source, AnswerSource::Cache);
        assert_eq!(retry.answer, RATE_LIMIT_MESSAGE);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_general_failure_uses_out_of_scope_message() {
        let client = Arc::new(
            MockClient::new("never").with_script([Err(LlmError::from_status(401, "bad key"))]),
        );
        let svc = service(client.clone());

        let answer = svc.answer("kapan pendaftaran dibuka?").await;
        assert_eq!(answer.answer, general_failure_message(SCHOOL));

        let again = svc.answer("kapan pendaftaran dibuka?").await;
        assert_eq!(again.source, AnswerSource::Cache);
        assert_eq!(again.answer, general_failure_message(SCHOOL));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_never_fails_when_provider_is_down() {
        let failures = (0..30).map(|_| Err(LlmError::Transport("down".to_string())));
        let client = Arc::new(MockClient::new("unused").with_script(failures));
        let svc = service(client);

        for question in ["apa saja fasilitas", "jelaskan rpl", "kapan libur?"] {
            let answer = svc.answer(question).await;
            assert!(!answer.answer.is_empty());
            assert!(answer.answer.starts_with("Maaf"));
        }
    }

    #[tokio::test]
    async fn test_broken_prompt_template_yields_apology() {
        let client = Arc::new(MockClient::new("unused"));
        let mut svc = service(client.clone());
        svc.prompts.context.template = "{{#if}}unclosed {{question}}".to_string();

        let answer = svc.answer("apa saja fasilitas").await;
        assert_eq!(answer.answer, GENERIC_FAILURE_MESSAGE);
        assert_eq!(client.calls(), 0);

        let stats = svc.get_stats();
        assert_eq!(stats.llm_calls, 0);
        assert_eq!(stats.total_questions, 1);
    }

    #[tokio::test]
    async fn test_stats_efficiency_and_reset() {
        let client = Arc::new(MockClient::new("Ada lab."));
        let svc = service(client);

        assert!(svc.get_stats().efficiency.is_none());

        svc.answer("siapa kepala sekolah").await;
        svc.answer("apa saja fasilitas").await;
        svc.answer("apa saja fasilitas").await;
        svc.answer("apa nama sekolah").await;

        let stats = svc.get_stats();
        assert_eq!(stats.total_questions, 4);
        let efficiency = stats.efficiency.unwrap();
        assert_eq!(efficiency.direct_answer_rate, "50.0%");
        assert_eq!(efficiency.cache_hit_rate, "25.0%");
        assert_eq!(efficiency.llm_usage_rate, "25.0%");
        assert_eq!(efficiency.token_saving_rate, "75.0%");

        svc.reset_stats();
        let stats = svc.get_stats();
        assert_eq!(stats.total_questions, 0);
        assert!(stats.efficiency.is_none());
    }

    #[tokio::test]
    async fn test_from_config_with_missing_data_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.data_path = dir.path().join("missing.json");
        config.llm.provider = "mock".to_string();

        let svc = AnswerService::from_config(&config, Arc::new(MockClient::new("umum"))).unwrap();
        assert!(!svc.knowledge().summary().loaded);

        let answer = svc.answer("siapa kepala sekolah").await;
        assert_eq!(answer.source, AnswerSource::Llm);
        assert_eq!(answer.answer, "umum");
    }
}
