//! Usage counters for the answer pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated without locking.
#[derive(Debug, Default)]
pub struct UsageStats {
    total_questions: AtomicU64,
    direct_answers: AtomicU64,
    cache_hits: AtomicU64,
    llm_calls: AtomicU64,
    no_context_found: AtomicU64,
    fallback_answers: AtomicU64,
}

/// Percentages derived from the counters, e.g. `"40.0%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Efficiency {
    pub direct_answer_rate: String,
    pub cache_hit_rate: String,
    pub llm_usage_rate: String,
    /// Direct answers plus cache hits
    pub token_saving_rate: String,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_questions: u64,
    pub direct_answers: u64,
    pub cache_hits: u64,
    pub llm_calls: u64,
    pub no_context_found: u64,
    pub fallback_answers: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<Efficiency>,
    pub started_at: DateTime<Utc>,
}

fn percent(part: u64, total: u64) -> String {
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}

impl UsageStats {
    pub fn record_question(&self) {
        self.total_questions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_direct(&self) {
        self.direct_answers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_llm_call(&self) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_context(&self) {
        self.no_context_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_answers.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters; the efficiency block is present once a question
    /// has been asked.
    pub fn snapshot(&self, started_at: DateTime<Utc>) -> StatsSnapshot {
        let total = self.total_questions.load(Ordering::Relaxed);
        let direct = self.direct_answers.load(Ordering::Relaxed);
        let cache = self.cache_hits.load(Ordering::Relaxed);
        let llm = self.llm_calls.load(Ordering::Relaxed);

        let efficiency = (total > 0).then(|| Efficiency {
            direct_answer_rate: percent(direct, total),
            cache_hit_rate: percent(cache, total),
            llm_usage_rate: percent(llm, total),
            token_saving_rate: percent(direct + cache, total),
        });

        StatsSnapshot {
            total_questions: total,
            direct_answers: direct,
            cache_hits: cache,
            llm_calls: llm,
            no_context_found: self.no_context_found.load(Ordering::Relaxed),
            fallback_answers: self.fallback_answers.load(Ordering::Relaxed),
            efficiency,
            started_at,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_questions,
            &self.direct_answers,
            &self.cache_hits,
            &self.llm_calls,
            &self.no_context_found,
            &self.fallback_answers,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_efficiency_without_questions() {
        let stats = UsageStats::default();
        let snapshot = stats.snapshot(Utc::now());
        assert_eq!(snapshot.total_questions, 0);
        assert!(snapshot.efficiency.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("efficiency").is_none());
    }

    #[test]
    fn test_rates_formatted_with_one_decimal() {
        let stats = UsageStats::default();
        for _ in 0..3 {
            stats.record_question();
        }
        stats.record_direct();
        stats.record_cache_hit();
        stats.record_llm_call();

        let efficiency = stats.snapshot(Utc::now()).efficiency.unwrap();
        assert_eq!(efficiency.direct_answer_rate, "33.3%");
        assert_eq!(efficiency.cache_hit_rate, "33.3%");
        assert_eq!(efficiency.llm_usage_rate, "33.3%");
        assert_eq!(efficiency.token_saving_rate, "66.7%");
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let stats = UsageStats::default();
        stats.record_question();
        stats.record_no_context();
        stats.record_fallback();
        stats.reset();

        let snapshot = stats.snapshot(Utc::now());
        assert_eq!(snapshot.total_questions, 0);
        assert_eq!(snapshot.no_context_found, 0);
        assert_eq!(snapshot.fallback_answers, 0);
    }
}
