//! Command handlers for the docqa CLI.
//!
//! This module organizes all CLI commands into separate submodules and holds
//! the wiring shared by the commands that touch the document service.

pub mod ask;
pub mod clean;
pub mod config;
pub mod prompts;
pub mod session;
pub mod stats;
pub mod upload;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use clean::CleanCommand;
pub use config::ConfigCommand;
pub use prompts::PromptsCommand;
pub use session::SessionCommand;
pub use stats::StatsCommand;
pub use upload::UploadCommand;

use docqa_core::{config::AppConfig, AppResult};
use docqa_llm::{create_client, ClientOptions};
use docqa_rag::embeddings::{create_provider, Embedder};
use docqa_rag::store::VectorIndexStore;
use docqa_rag::{DocumentService, ModelSelection, RagConfig};
use std::time::Duration;

/// Answer and clarify models, most specific setting first.
fn model_selection(config: &AppConfig, rag: &RagConfig) -> ModelSelection {
    let clarify_model = config
        .clarify_model
        .clone()
        .or_else(|| rag.clarify_model.clone())
        .unwrap_or_else(|| config.model.clone());

    ModelSelection {
        answer_model: config.model.clone(),
        clarify_model,
    }
}

/// Build the document service for the configured workspace and provider.
pub(crate) fn open_service(config: &AppConfig) -> AppResult<DocumentService> {
    config.validate()?;
    let rag = RagConfig::load(&config.workspace)?;

    let options = ClientOptions {
        endpoint: config.resolve_endpoint(),
        api_key: config.resolve_api_key(&config.provider),
        timeout_secs: Some(
            config
                .resolve_timeout()
                .unwrap_or(rag.request_timeout_secs),
        ),
    };
    let llm = create_client(&config.provider, &options)?;
    let models = model_selection(config, &rag);

    tracing::debug!(
        "Models: answer={}, clarify={}",
        models.answer_model,
        models.clarify_model
    );

    DocumentService::new(&config.workspace, rag, llm, models)
}

/// Open the index store without a language model (stats, clean).
pub(crate) fn open_store(config: &AppConfig) -> AppResult<VectorIndexStore> {
    let rag = RagConfig::load(&config.workspace)?;
    let timeout = Duration::from_secs(rag.request_timeout_secs);
    let provider = create_provider(&rag.embedding, timeout)?;
    let embedder = Embedder::new(provider, rag.embedding.batch_size);

    Ok(VectorIndexStore::new(
        rag.storage.resolve(&config.workspace),
        embedder,
    ))
}

/// Print a serializable value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
