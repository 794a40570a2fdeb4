//! Retrieval and answering type definitions.

use chrono::{DateTime, Utc};
use docqa_core::AppError;
use serde::{Deserialize, Serialize};

/// A contiguous slice of document text, the atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,

    /// Index in the sequence produced by one chunking pass
    pub position: usize,
}

/// A passage returned by the retriever, scored by the reranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub chunk_text: String,
    pub relevance_score: f32,
}

/// One answered question, kept in the process-lifetime history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub query: String,
    pub answer: String,
}

/// Result of building an index from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub build_id: String,
    pub chunks: usize,
    pub dimension: usize,
    pub built_at: DateTime<Utc>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    /// Human-readable status line
    pub message: String,

    /// Extraction detail line
    pub details: String,

    /// Pages read from the PDF (0 for plain text)
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub duration_secs: f64,
}

/// Error payload carried by an [`AskResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable snake_case tag (see `AppError::kind`)
    pub kind: String,
    pub message: String,
}

impl From<&AppError> for ErrorPayload {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Response of the Ask boundary. Always carries a renderable `answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub success: bool,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    pub previous_responses: Vec<AnswerRecord>,
}

/// Statistics about the persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub build_id: String,
    pub chunks: usize,
    pub dimension: usize,
    pub built_at: DateTime<Utc>,
    pub index_bytes: u64,
    pub chunks_bytes: u64,
}

/// Liveness summary for the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub index_loaded: bool,
    pub history_len: usize,
}
