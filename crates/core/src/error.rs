//! Error types for docqa.
//!
//! This module defines a unified error enum covering every failure category
//! of the document question-answering pipeline: configuration, I/O, input
//! validation, extraction, indexing, persistence and upstream model calls.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed caller input (bad file, empty query, unreadable PDF)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The source document yielded no extractable text
    #[error("Empty document: {0}")]
    EmptyDocument(String),

    /// No index has been built yet
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Embedding generation or validation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Persisted artifacts could not be written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Persisted artifacts are malformed or do not belong together
    #[error("Corrupted index: {0}")]
    Corruption(String),

    /// Embedder, reranker or language-model call failed
    #[error("Upstream model error: {0}")]
    UpstreamModel(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Stable snake_case tag for structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::InvalidInput(_) => "invalid_input",
            Self::EmptyDocument(_) => "empty_document",
            Self::IndexUnavailable(_) => "index_unavailable",
            Self::Embedding(_) => "embedding",
            Self::Persistence(_) => "persistence",
            Self::Corruption(_) => "corruption",
            Self::UpstreamModel(_) => "upstream_model",
            Self::Prompt(_) => "prompt",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }

    /// Whether the error was caused by the caller rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::EmptyDocument(_) | Self::IndexUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
