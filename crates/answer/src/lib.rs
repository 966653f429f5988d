//! Hybrid answer pipeline for the school assistant.
//!
//! [`AnswerService`] resolves a question through, in order:
//! - a direct answer assembled from the school data
//! - the response cache
//! - keyword retrieval plus a model call with the matched data
//! - the no-context policy (general-knowledge call or a fixed reply)

pub mod cache;
pub mod orchestrator;
pub mod stats;
pub mod types;

pub use cache::{fingerprint, CacheStats, ResponseCache};
pub use orchestrator::{
    general_failure_message, no_information_message, AnswerService, ServiceOptions,
};
pub use stats::{Efficiency, StatsSnapshot, UsageStats};
pub use types::{Answer, AnswerMetadata, AnswerSource};
