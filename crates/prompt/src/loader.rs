//! Prompt loader for built-in and workspace YAML prompt definitions.
//!
//! Every prompt ships compiled into the binary. A workspace may override any
//! of them (or add new ones) with `.docqa/prompts/<id>.yml`.

use crate::types::{PromptDefinition, PromptSource, PromptSummary};
use docqa_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prompt used for single-hop grounded answers.
pub const ANSWER_SINGLE: &str = "rag.answer.single";
/// Prompt used to generate the clarifying sub-query.
pub const CLARIFY: &str = "rag.clarify";
/// Prompt used for the final multi-hop answer.
pub const ANSWER_MULTI: &str = "rag.answer.multi";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        ANSWER_SINGLE,
        include_str!("../prompts/rag.answer.single.yml"),
    ),
    (CLARIFY, include_str!("../prompts/rag.clarify.yml")),
    (
        ANSWER_MULTI,
        include_str!("../prompts/rag.answer.multi.yml"),
    ),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".docqa/prompts")
}

/// Load a prompt definition by ID.
///
/// The workspace file `.docqa/prompts/<id>.yml` takes precedence over the
/// built-in definition of the same ID.
///
/// # Example
/// ```no_run
/// use docqa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "rag.clarify")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        let definition = load_prompt_file(&prompt_file)?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }
        return Ok(definition);
    }

    load_builtin(prompt_id)
}

/// Load a compiled-in prompt definition.
pub fn load_builtin(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(source, prompt_id)
}

fn load_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    parse_prompt(&contents, &path.display().to_string())
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// List every available prompt: built-ins plus workspace files, with
/// workspace entries shadowing built-ins of the same ID.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<PromptSummary>> {
    let mut prompts: BTreeMap<String, PromptSummary> = BTreeMap::new();

    for (id, _) in BUILTIN_PROMPTS {
        let def = load_builtin(id)?;
        prompts.insert(
            def.id.clone(),
            PromptSummary {
                id: def.id,
                title: def.title,
                source: PromptSource::Builtin,
            },
        );
    }

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("yml") {
                continue;
            }

            match load_prompt_file(path) {
                Ok(def) => {
                    prompts.insert(
                        def.id.clone(),
                        PromptSummary {
                            id: def.id,
                            title: def.title,
                            source: PromptSource::Workspace,
                        },
                    );
                }
                Err(e) => tracing::warn!("Skipping invalid prompt file {:?}: {}", path, e),
            }
        }
    }

    Ok(prompts.into_values().collect())
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
