//! Prompt system for the school assistant.
//!
//! This crate provides structured prompt management with:
//! - Built-in prompts for answering with and without school data
//! - YAML overrides loaded from a prompts directory
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, load_prompt, PromptLibrary, CONTEXT_PROMPT_ID, GENERAL_PROMPT_ID,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
