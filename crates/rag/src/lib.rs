//! Retrieval-augmented question answering over one uploaded document.
//!
//! Write path: PDF bytes → [`extract`] → [`chunker`] → [`embeddings`] →
//! [`store`]. Read path: query → [`retriever`] (embed, search, rerank) →
//! [`pipeline`] (single-hop or multi-hop) → answer. [`service`] ties both
//! paths together behind the Upload and Ask operations.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod history;
pub mod pipeline;
pub mod rerank;
pub mod retriever;
pub mod service;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::{RagConfig, StorageConfig};
pub use pipeline::{AnswerOutcome, AnswerStrategy, ModelSelection, PromptSet, FALLBACK_ANSWER};
pub use service::{DocumentService, ServiceParts};
pub use types::{
    AnswerRecord, AskResponse, BuildReport, Chunk, ErrorPayload, HealthStatus, IndexStats,
    ScoredPassage, UploadReport,
};
