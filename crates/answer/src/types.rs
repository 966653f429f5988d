//! Answer types returned to callers.

use serde::Serialize;

/// Which pipeline stage produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Direct,
    Cache,
    Llm,
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Cache => "cache",
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

/// Informational details about how an answer was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerMetadata {
    /// Pipeline stage that returned
    pub stage: &'static str,

    pub llm_used: bool,

    /// Rough token estimate saved by skipping the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_saved: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_available: Option<bool>,

    /// Length of the formatted context in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
}

impl AnswerMetadata {
    fn saved(stage: &'static str, tokens_saved: &'static str) -> Self {
        Self {
            stage,
            llm_used: false,
            tokens_saved: Some(tokens_saved),
            context_available: None,
            context_length: None,
            matched_keyword: None,
        }
    }

    pub fn direct() -> Self {
        Self::saved("direct", "~500")
    }

    pub fn cache() -> Self {
        Self::saved("cache", "~300")
    }

    /// Model answer using retrieved school data.
    pub fn with_context(context_length: usize, matched_keyword: &str) -> Self {
        Self {
            stage: "generate",
            llm_used: true,
            tokens_saved: None,
            context_available: Some(true),
            context_length: Some(context_length),
            matched_keyword: Some(matched_keyword.to_string()),
        }
    }

    /// Model answer without school data.
    pub fn without_context() -> Self {
        Self {
            stage: "generate",
            llm_used: true,
            tokens_saved: None,
            context_available: Some(false),
            context_length: Some(0),
            matched_keyword: None,
        }
    }

    pub fn fallback() -> Self {
        Self {
            stage: "retrieve",
            llm_used: false,
            tokens_saved: None,
            context_available: Some(false),
            context_length: Some(0),
            matched_keyword: None,
        }
    }
}

/// The result of answering one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    #[serde(rename = "jawaban")]
    pub answer: String,
    pub source: AnswerSource,
    pub metadata: AnswerMetadata,
}

impl Answer {
    pub fn new(answer: impl Into<String>, source: AnswerSource, metadata: AnswerMetadata) -> Self {
        Self {
            answer: answer.into(),
            source,
            metadata,
        }
    }
}
