//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system template (when present) and the user template are
/// rendered with the same variables.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "What is Rust?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?
        .map(|s| s.trim_end().to_string());
    let user = render_template(&definition.template, &variables)?
        .trim_end()
        .to_string();

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Document text must reach the model verbatim.
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptOutputSpec};

    fn definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior::default(),
            system: system.map(str::to_string),
            template: "Context: {{context}}\n\nQuestion: {{query}}\n".to_string(),
            output: PromptOutputSpec::default(),
        }
    }

    fn vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "Rust is <fast> & safe.".to_string());
        vars.insert("query".to_string(), "What is Rust?".to_string());
        vars.insert("fallback".to_string(), "Not found.".to_string());
        vars
    }

    #[test]
    fn test_render_does_not_escape() {
        let rendered = render_template("{{context}}", &vars()).unwrap();
        assert_eq!(rendered, "Rust is <fast> & safe.");
    }

    #[test]
    fn test_build_prompt_renders_system_and_user() {
        let built = build_prompt(&definition(Some("Otherwise say \"{{fallback}}\"\n")), vars())
            .unwrap();

        assert_eq!(built.system.as_deref(), Some("Otherwise say \"Not found.\""));
        assert_eq!(
            built.user,
            "Context: Rust is <fast> & safe.\n\nQuestion: What is Rust?"
        );
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_prompt_without_system() {
        let built = build_prompt(&definition(None), vars()).unwrap();
        assert!(built.system.is_none());
    }

    #[test]
    fn test_malformed_template_is_prompt_error() {
        let err = render_template("{{#if}}", &vars()).unwrap_err();
        assert_eq!(err.kind(), "prompt");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert_eq!(result.unwrap(), "Question: ");
    }
}
