//! Prompt builder for rendering templates and injecting context.

use crate::types::{BuiltPrompt, PromptDefinition};
use schoolbot_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Injects the retrieved knowledge as `context` if the template uses it
/// 2. Renders the template using Handlebars with provided variables
/// 3. Returns a `BuiltPrompt` ready for the gateway
///
/// # Arguments
/// * `definition` - Prompt definition (built in or loaded from YAML)
/// * `variables` - Template variables (`system`, `question`, `school`, ...)
/// * `context` - Optional formatted knowledge fragment
///
/// # Example
/// ```no_run
/// use schoolbot_prompt::{build_prompt, PromptLibrary};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let library = PromptLibrary::builtin();
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Apa saja fasilitas?".to_string());
///
/// let built = build_prompt(&library.context, vars, Some("lab: 3".to_string()))?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
    context: Option<String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let context_included = if definition.includes_context {
        match context {
            Some(ctx) => {
                variables.insert("context".to_string(), ctx);
                true
            }
            None => {
                tracing::warn!(
                    "Prompt '{}' expects knowledge context but none was provided",
                    definition.id
                );
                false
            }
        }
    } else {
        false
    };

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        rendered,
        definition.id.clone(),
        context_included,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(includes_context: bool) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            includes_context,
            template: "{{system}}|{{context}}|{{question}}".to_string(),
        }
    }

    fn vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("system".to_string(), "Kamu asisten.".to_string());
        vars.insert("question".to_string(), "Ada lab?".to_string());
        vars
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Siapa kepsek?".to_string());

        let result = render_template("Pertanyaan: {{question}}", &vars).unwrap();
        assert_eq!(result, "Pertanyaan: Siapa kepsek?");
    }

    #[test]
    fn test_context_not_html_escaped() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "lab: <3> & wifi".to_string());

        let result = render_template("{{context}}", &vars).unwrap();
        assert_eq!(result, "lab: <3> & wifi");
    }

    #[test]
    fn test_build_prompt_with_context() {
        let built =
            build_prompt(&definition(true), vars(), Some("lab: 3".to_string())).unwrap();
        assert_eq!(built.text, "Kamu asisten.|lab: 3|Ada lab?");
        assert!(built.metadata.context_included);
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_prompt_ignores_context_when_template_does_not_use_it() {
        let built =
            build_prompt(&definition(false), vars(), Some("lab: 3".to_string())).unwrap();
        assert_eq!(built.text, "Kamu asisten.||Ada lab?");
        assert!(!built.metadata.context_included);
    }

    #[test]
    fn test_build_prompt_missing_context_renders_empty() {
        let built = build_prompt(&definition(true), vars(), None).unwrap();
        assert_eq!(built.text, "Kamu asisten.||Ada lab?");
        assert!(!built.metadata.context_included);
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let mut def = definition(false);
        def.template = "{{#if}}unclosed".to_string();
        let result = build_prompt(&def, vars(), None);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
