//! Prompt loading: built-in templates with optional YAML overrides.

use crate::types::PromptDefinition;
use schoolbot_core::{AppError, AppResult};
use std::path::Path;

/// Prompt used when a knowledge fragment was retrieved.
pub const CONTEXT_PROMPT_ID: &str = "school.ask.context";

/// Prompt used when no keyword rule resolved.
pub const GENERAL_PROMPT_ID: &str = "school.ask.general";

const CONTEXT_TEMPLATE: &str = "{{system}}

Data sekolah:
{{context}}

Pertanyaan: {{question}}

Jawab dengan gaya natural dan informatif:";

const GENERAL_TEMPLATE: &str = "{{system}}

Pertanyaan: {{question}}

Catatan: Jika pertanyaan tentang {{school}} tapi tidak ada data spesifik, jawab dengan pengetahuan umum tentang SMK atau topik terkait. Jika benar-benar tidak relevan dengan sekolah, beritahu dengan sopan dan sarankan topik yang bisa ditanyakan.

Jawab:";

fn definition(id: &str, title: &str, includes_context: bool, template: &str) -> PromptDefinition {
    PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        includes_context,
        template: template.to_string(),
    }
}

/// Return the built-in definition for `prompt_id`, if there is one.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    match prompt_id {
        CONTEXT_PROMPT_ID => Some(definition(
            CONTEXT_PROMPT_ID,
            "Answer from school data",
            true,
            CONTEXT_TEMPLATE,
        )),
        GENERAL_PROMPT_ID => Some(definition(
            GENERAL_PROMPT_ID,
            "Answer from general knowledge",
            false,
            GENERAL_TEMPLATE,
        )),
        _ => None,
    }
}

/// Load a prompt definition by ID.
///
/// `<prompts_dir>/<id>.yml` wins when it exists; otherwise the built-in
/// definition is used. An ID with neither is an error.
///
/// # Example
/// ```no_run
/// use schoolbot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Some(Path::new("prompts")), "school.ask.context")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        let prompt_file = dir.join(format!("{}.yml", prompt_id));
        if prompt_file.exists() {
            tracing::debug!("Loading prompt override from: {:?}", prompt_file);

            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;

            let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to parse prompt YAML {:?}: {}",
                    prompt_file, e
                ))
            })?;

            validate_prompt(&definition, prompt_id)?;
            tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
            return Ok(definition);
        }
    }

    builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

/// The prompts the answer pipeline needs.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    /// Prompt with retrieved school data
    pub context: PromptDefinition,

    /// Prompt relying on general knowledge
    pub general: PromptDefinition,
}

impl PromptLibrary {
    /// Built-in prompts only.
    pub fn builtin() -> Self {
        Self {
            context: definition(
                CONTEXT_PROMPT_ID,
                "Answer from school data",
                true,
                CONTEXT_TEMPLATE,
            ),
            general: definition(
                GENERAL_PROMPT_ID,
                "Answer from general knowledge",
                false,
                GENERAL_TEMPLATE,
            ),
        }
    }

    /// Load both prompts, honouring overrides in `prompts_dir`.
    pub fn load(prompts_dir: Option<&Path>) -> AppResult<Self> {
        Ok(Self {
            context: load_prompt(prompts_dir, CONTEXT_PROMPT_ID)?,
            general: load_prompt(prompts_dir, GENERAL_PROMPT_ID)?,
        })
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition, expected_id: &str) -> AppResult<()> {
    if def.id != expected_id {
        return Err(AppError::Prompt(format!(
            "Prompt file for '{}' declares id '{}'",
            expected_id, def.id
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if !def.template.contains("{{question}}") {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' never renders {{{{question}}}}",
            def.id
        )));
    }

    Ok(())
}
