//! School knowledge: the data document, direct answers and keyword retrieval.
//!
//! The document is loaded once at startup and shared read-only. A missing or
//! malformed data file leaves the assistant running with an empty document.

pub mod direct;
pub mod document;
pub mod retriever;
pub mod rules;

pub use direct::{default_direct_rules, DirectAnswerMatcher, DirectRule, Predicate};
pub use document::{KnowledgeDocument, KnowledgeMap, KnowledgeValue};
pub use retriever::{KeywordRetriever, RetrievedFragment, ELLIPSIS};
pub use rules::{default_rules, KeywordRule};

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Summary of the loaded data, reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeSummary {
    pub loaded: bool,
    pub sections: Vec<String>,
}

/// Read-only view over the school data used by the answer pipeline.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    document: Arc<KnowledgeDocument>,
    direct: DirectAnswerMatcher,
    retriever: KeywordRetriever,
}

impl KnowledgeBase {
    /// Wrap an already loaded document with the built-in rules.
    pub fn new(
        document: KnowledgeDocument,
        school_name: impl Into<String>,
        max_context_length: usize,
    ) -> Self {
        let document = Arc::new(document);
        Self {
            direct: DirectAnswerMatcher::with_default_rules(school_name),
            retriever: KeywordRetriever::new(
                Arc::clone(&document),
                default_rules(),
                max_context_length,
            ),
            document,
        }
    }

    /// Load the data file at `path`, degrading to an empty document.
    pub fn load(path: &Path, school_name: impl Into<String>, max_context_length: usize) -> Self {
        Self::new(
            KnowledgeDocument::load_or_empty(path),
            school_name,
            max_context_length,
        )
    }

    /// A templated answer for a simple factual question, if any rule fits.
    pub fn direct_answer(&self, question: &str) -> Option<String> {
        self.direct.answer(&self.document, question)
    }

    /// The first section whose keyword occurs in the question.
    pub fn retrieve(&self, question: &str) -> Option<RetrievedFragment<'_>> {
        self.retriever.retrieve(question)
    }

    /// Bounded prompt context for a retrieved fragment.
    pub fn format(&self, fragment: &RetrievedFragment<'_>) -> String {
        self.retriever.format(fragment)
    }

    pub fn summary(&self) -> KnowledgeSummary {
        KnowledgeSummary {
            loaded: self.document.is_loaded(),
            sections: self.document.sections().map(str::to_string).collect(),
        }
    }
}
