//! Retrieval configuration (`.docqa/rag.yaml`).

use crate::pipeline::AnswerStrategy;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level retrieval configuration.
///
/// Every section has defaults, so an absent or partial `rag.yaml` is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub reranker: RerankerConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,

    /// Strategy used when a request does not name one
    pub default_strategy: AnswerStrategy,

    /// Model for the clarifying query; falls back to the answer model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarify_model: Option<String>,

    /// Maximum number of answers kept in memory
    pub history_capacity: usize,

    /// Timeout for embedding and rerank HTTP calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            reranker: RerankerConfig::default(),
            retrieval: RetrievalConfig::default(),
            storage: StorageConfig::default(),
            default_strategy: AnswerStrategy::default(),
            clarify_model: None,
            history_capacity: 100,
            request_timeout_secs: 120,
        }
    }
}

/// Paragraph splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub separator: String,

    /// Maximum chunk length in grapheme clusters
    pub chunk_size: usize,

    /// Overlap between windows of an oversized paragraph
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            separator: "\n\n".to_string(),
            chunk_size: 200,
            chunk_overlap: 10,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum texts per embedding request
    pub batch_size: usize,

    /// Base URL for HTTP providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: 64,
            endpoint: None,
        }
    }
}

/// Reranker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RerankerConfig {
    /// Provider name: "lexical" or "http"
    pub provider: String,

    pub model: String,

    /// Base URL of a `/rerank` service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            provider: "lexical".to_string(),
            model: "lexical-v1".to_string(),
            endpoint: None,
        }
    }
}

/// Candidate and final passage counts for one retrieval pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalDepth {
    /// Candidates fetched from the index
    pub top_k_search: usize,

    /// Passages kept after reranking
    pub top_k_final: usize,
}

/// Retrieval depth per strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub single_hop: RetrievalDepth,
    pub multi_hop: RetrievalDepth,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            single_hop: RetrievalDepth {
                top_k_search: 10,
                top_k_final: 3,
            },
            multi_hop: RetrievalDepth {
                top_k_search: 5,
                top_k_final: 5,
            },
        }
    }
}

/// Where the index artifacts live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory relative to the workspace (or absolute)
    pub dir: PathBuf,
    pub index_file: String,
    pub chunks_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".docqa/index"),
            index_file: "index.bin".to_string(),
            chunks_file: "chunks.json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolve the storage directory against a workspace root.
    pub fn resolve(&self, workspace: &Path) -> Self {
        Self {
            dir: workspace.join(&self.dir),
            ..self.clone()
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(&self.index_file)
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.dir.join(&self.chunks_file)
    }
}

impl RagConfig {
    /// Path of the retrieval config file inside a workspace.
    pub fn config_path(workspace: &Path) -> PathBuf {
        workspace.join(".docqa").join("rag.yaml")
    }

    /// Load `.docqa/rag.yaml`, or defaults when the file does not exist.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let config_path = Self::config_path(workspace);

        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|e| {
                AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
            })?;

            let config: Self = serde_yaml::from_str(&content).map_err(|e| {
                AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
            })?;

            tracing::debug!("Loaded retrieval config from {:?}", config_path);
            config
        } else {
            tracing::debug!("No rag.yaml found, using default retrieval config");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `.docqa/rag.yaml`.
    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let config_path = Self::config_path(workspace);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&config_path, serde_yaml::to_string(self)?)?;
        tracing::debug!("Saved retrieval config to {:?}", config_path);
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be > 0".to_string()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        if chunking.separator.is_empty() {
            return Err(AppError::Config("separator cannot be empty".to_string()));
        }
        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding dimensions and batch_size must be > 0".to_string(),
            ));
        }
        for (name, depth) in [
            ("single_hop", self.retrieval.single_hop),
            ("multi_hop", self.retrieval.multi_hop),
        ] {
            if depth.top_k_search == 0 || depth.top_k_final == 0 {
                return Err(AppError::Config(format!(
                    "retrieval.{} depths must be > 0",
                    name
                )));
            }
        }
        if self.history_capacity == 0 {
            return Err(AppError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.chunking.chunk_overlap, 10);
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.retrieval.single_hop.top_k_search, 10);
        assert_eq!(config.retrieval.multi_hop.top_k_final, 5);
        assert_eq!(config.default_strategy, AnswerStrategy::MultiHop);
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.request_timeout_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "chunking:\n  chunk_size: 120\ndefault_strategy: single-hop\n";
        let config: RagConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.chunking.chunk_size, 120);
        assert_eq!(config.chunking.separator, "\n\n");
        assert_eq!(config.default_strategy, AnswerStrategy::SingleHop);
        assert_eq!(config.storage.index_file, "index.bin");
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = RagConfig::load(temp.path()).unwrap();
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let mut config = RagConfig::default();
        config.reranker.provider = "http".to_string();
        config.reranker.endpoint = Some("http://localhost:8081".to_string());
        config.save(temp.path()).unwrap();

        let loaded = RagConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.reranker, config.reranker);
    }

    #[test]
    fn test_storage_resolution() {
        let storage = StorageConfig::default().resolve(Path::new("/ws"));
        assert_eq!(storage.index_path(), PathBuf::from("/ws/.docqa/index/index.bin"));
        assert_eq!(storage.chunks_path(), PathBuf::from("/ws/.docqa/index/chunks.json"));
    }
}
