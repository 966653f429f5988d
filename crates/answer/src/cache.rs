//! In-memory response cache keyed by a fingerprint of the question.

use schoolbot_core::config::CacheSettings;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Normalize a question and hash it with SHA-256 (lowercase hex).
///
/// Questions differing only in surrounding whitespace or letter case share
/// a fingerprint.
pub fn fingerprint(question: &str) -> String {
    let normalized = question.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    answer: String,
    created_at: Instant,
}

/// Cache statistics as reported by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Stored entries, possibly including expired ones not yet purged
    pub total_cached: usize,
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: Option<usize>,
}

/// Answer cache with a fixed time-to-live.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    enabled: bool,
    max_entries: Option<usize>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            enabled: true,
            max_entries: None,
        }
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    /// Bound the number of stored entries.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        if !settings.enabled {
            return Self::disabled();
        }
        let cache = Self::new(Duration::from_secs(settings.ttl_secs));
        match settings.max_entries {
            Some(max) => cache.with_max_entries(max),
            None => cache,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock leaves the map itself intact
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached answer for `question`, if present and fresh.
    pub fn get(&self, question: &str) -> Option<String> {
        self.get_at(question, Instant::now())
    }

    /// Like [`get`](Self::get) with an explicit clock reading.
    ///
    /// An entry whose age has reached the TTL is removed and treated as absent.
    pub fn get_at(&self, question: &str, now: Instant) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = fingerprint(question);
        let mut entries = self.lock();
        let entry = entries.get(&key)?;

        if now.saturating_duration_since(entry.created_at) >= self.ttl {
            entries.remove(&key);
            tracing::debug!("Cache entry expired");
            return None;
        }

        Some(entry.answer.clone())
    }

    /// Store `answer` for `question`, replacing any previous entry.
    pub fn set(&self, question: &str, answer: &str) {
        self.set_at(question, answer, Instant::now());
    }

    /// Like [`set`](Self::set) with an explicit clock reading.
    pub fn set_at(&self, question: &str, answer: &str, now: Instant) {
        if !self.enabled {
            return;
        }

        let key = fingerprint(question);
        let mut entries = self.lock();

        if let Some(max) = self.max_entries {
            if !entries.contains_key(&key) && entries.len() >= max {
                let ttl = self.ttl;
                entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) < ttl);

                while entries.len() >= max {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, entry)| entry.created_at)
                        .map(|(key, _)| key.clone());
                    match oldest {
                        Some(oldest) => {
                            entries.remove(&oldest);
                        }
                        None => break,
                    }
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                answer: answer.to_string(),
                created_at: now,
            },
        );
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        tracing::info!(removed, "Cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_cached: self.lock().len(),
            enabled: self.enabled,
            ttl_seconds: self.ttl.as_secs(),
            max_entries: self.max_entries,
        }
    }
}
