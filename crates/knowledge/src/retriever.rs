//! Keyword retrieval and context formatting.

use crate::document::{KnowledgeDocument, KnowledgeValue};
use crate::rules::KeywordRule;
use std::sync::Arc;

/// Marker appended to truncated context.
pub const ELLIPSIS: &str = "...";

/// A document section found through a keyword rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedFragment<'a> {
    /// Trigger phrase that matched
    pub keyword: &'a str,

    /// Path the rule resolved
    pub path: &'a [String],

    /// Resolved value
    pub value: &'a KnowledgeValue,
}

/// First-match keyword scanner over the knowledge document.
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    document: Arc<KnowledgeDocument>,
    rules: Vec<KeywordRule>,
    max_context_length: usize,
}

impl KeywordRetriever {
    pub fn new(
        document: Arc<KnowledgeDocument>,
        rules: Vec<KeywordRule>,
        max_context_length: usize,
    ) -> Self {
        Self {
            document,
            rules,
            max_context_length,
        }
    }

    /// Every resolved fragment for `question`, in rule order.
    ///
    /// Rules whose trigger is absent from the question, or whose path does
    /// not resolve to a non-null value, are skipped.
    pub fn retrieve_all(&self, question: &str) -> Vec<RetrievedFragment<'_>> {
        let question = question.to_lowercase();

        self.rules
            .iter()
            .filter(|rule| question.contains(rule.trigger.as_str()))
            .filter_map(|rule| {
                let value = self.document.resolve(&rule.path)?;
                if value.is_null() {
                    return None;
                }
                Some(RetrievedFragment {
                    keyword: rule.trigger.as_str(),
                    path: rule.path.as_slice(),
                    value,
                })
            })
            .collect()
    }

    /// The first resolved fragment for `question`.
    pub fn retrieve(&self, question: &str) -> Option<RetrievedFragment<'_>> {
        let fragment = self.retrieve_all(question).into_iter().next();
        match &fragment {
            Some(f) => tracing::debug!(keyword = f.keyword, path = ?f.path, "Keyword matched"),
            None => tracing::debug!("No keyword rule resolved"),
        }
        fragment
    }

    /// Render a fragment as bounded prompt context.
    ///
    /// Mappings become `key: value` pairs joined by ` | `, keeping only
    /// scalar and list-valued keys; nested mappings are dropped rather than
    /// rendered recursively. Lists are joined by `, `. The result is cut to
    /// `max_context_length` characters with [`ELLIPSIS`] appended.
    pub fn format(&self, fragment: &RetrievedFragment<'_>) -> String {
        let context = match fragment.value {
            KnowledgeValue::Map(map) => map
                .iter()
                .filter(|(_, value)| value.is_scalar() || matches!(value, KnowledgeValue::List(_)))
                .map(|(key, value)| format!("{}: {}", key, value))
                .collect::<Vec<_>>()
                .join(" | "),
            other => other.to_string(),
        };

        truncate_chars(context, self.max_context_length)
    }
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut truncated = text[..byte_index].to_string();
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => text,
    }
}
