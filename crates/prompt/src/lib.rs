//! Prompt system for docqa.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, compiled in and overridable per workspace
//! - Handlebars template rendering for system and user messages

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_builtin, load_prompt, ANSWER_MULTI, ANSWER_SINGLE, CLARIFY};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec,
    PromptSource, PromptSummary,
};
