//! Document service: owns the index, the pipeline and the answer history.
//!
//! Upload and Ask are the two boundary operations. Uploads are serialized;
//! readers share the loaded index through an `Arc` so both hops of one
//! request always see the same index. The cached index is checked against
//! the manifest on disk at the start of every request, so an upload made by
//! another process is picked up by the next question.

use crate::chunker::Chunker;
use crate::config::{RagConfig, StorageConfig};
use crate::embeddings::{create_provider, Embedder};
use crate::extract;
use crate::history::AnswerHistory;
use crate::pipeline::{AnswerOutcome, AnswerPipeline, AnswerStrategy, ModelSelection, PromptSet};
use crate::rerank::{create_reranker, Reranker};
use crate::retriever::Retriever;
use crate::store::{run_blocking, FlatIndex, VectorIndexStore};
use crate::types::{
    AnswerRecord, AskResponse, ErrorPayload, HealthStatus, IndexStats, UploadReport,
};
use docqa_core::{AppError, AppResult};
use docqa_llm::LlmClient;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Everything a [`DocumentService`] is assembled from.
pub struct ServiceParts {
    pub config: RagConfig,

    /// Storage location, already resolved against the workspace
    pub storage: StorageConfig,
    pub embedder: Embedder,
    pub reranker: Arc<dyn Reranker>,
    pub llm: Arc<dyn LlmClient>,
    pub prompts: PromptSet,
    pub models: ModelSelection,
}

pub struct DocumentService {
    config: RagConfig,
    chunker: Chunker,
    store: VectorIndexStore,
    pipeline: AnswerPipeline,
    loaded: RwLock<Option<Arc<FlatIndex>>>,
    history: Mutex<AnswerHistory>,
    upload_lock: Mutex<()>,
}

impl DocumentService {
    /// Build a service for a workspace from its retrieval configuration.
    pub fn new(
        workspace: &Path,
        config: RagConfig,
        llm: Arc<dyn LlmClient>,
        models: ModelSelection,
    ) -> AppResult<Self> {
        config.validate()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let provider = create_provider(&config.embedding, timeout)?;
        let embedder = Embedder::new(provider, config.embedding.batch_size);
        let reranker = create_reranker(&config.reranker, timeout)?;
        let prompts = PromptSet::load(workspace)?;
        let storage = config.storage.resolve(workspace);

        Self::from_parts(ServiceParts {
            config,
            storage,
            embedder,
            reranker,
            llm,
            prompts,
            models,
        })
    }

    pub fn from_parts(parts: ServiceParts) -> AppResult<Self> {
        let chunker = Chunker::new(&parts.config.chunking)?;
        let retriever = Retriever::new(parts.embedder.clone(), parts.reranker);
        let pipeline = AnswerPipeline::new(
            retriever,
            parts.llm,
            parts.prompts,
            parts.models,
            parts.config.retrieval.clone(),
        );

        tracing::debug!(
            "Document service ready (embedder: {}/{}, index dir: {:?})",
            parts.embedder.provider_name(),
            parts.embedder.model_name(),
            parts.storage.dir
        );

        Ok(Self {
            history: Mutex::new(AnswerHistory::new(parts.config.history_capacity)),
            store: VectorIndexStore::new(parts.storage, parts.embedder),
            config: parts.config,
            chunker,
            pipeline,
            loaded: RwLock::new(None),
            upload_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Extract, chunk and index a PDF, replacing any previous index.
    pub async fn upload_pdf(&self, bytes: &[u8]) -> AppResult<UploadReport> {
        let start = Instant::now();
        tracing::info!("Processing PDF upload ({} bytes)", bytes.len());

        let bytes = bytes.to_vec();
        let (pages, text) = run_blocking("PDF extraction", move || {
            let pages = extract::extract_pages(&bytes)?;
            let text = extract::join_pages(&pages)?;
            Ok((pages.len(), text))
        })
        .await?;

        let _guard = self.upload_lock.lock().await;
        self.index_text(&text, pages, start, "PDF processed successfully")
            .await
    }

    /// Index plain text, replacing any previous index.
    pub async fn ingest_text(&self, text: &str) -> AppResult<UploadReport> {
        let _guard = self.upload_lock.lock().await;
        let start = Instant::now();
        tracing::info!("Processing text upload ({} bytes)", text.len());

        self.index_text(text, 0, start, "Text processed successfully")
            .await
    }

    async fn index_text(
        &self,
        text: &str,
        pages: usize,
        start: Instant,
        message: &str,
    ) -> AppResult<UploadReport> {
        let chunks = self.chunker.split(text)?;
        let (report, index) = self.store.build(&chunks).await?;

        *self.loaded.write().await = Some(Arc::new(index));

        let duration = start.elapsed();
        tracing::info!(
            "Indexed {} chunks from {} pages in {:.2}s",
            report.chunks,
            pages,
            duration.as_secs_f64()
        );

        Ok(UploadReport {
            message: message.to_string(),
            details: "Successfully extracted text from all pages.".to_string(),
            pages,
            chunks: report.chunks,
            dimension: report.dimension,
            duration_secs: duration.as_secs_f64(),
        })
    }

    /// The index currently on disk, reusing the cached copy while its build
    /// id still matches the persisted manifest.
    ///
    /// While an upload in this process is rewriting the files, the previous
    /// cached index is served instead of reading a half-written pair.
    async fn current_index(&self) -> AppResult<Arc<FlatIndex>> {
        let cached = self.loaded.read().await.clone();
        let _guard = match (self.upload_lock.try_lock(), &cached) {
            (Ok(guard), _) => guard,
            (Err(_), Some(index)) => return Ok(Arc::clone(index)),
            (Err(_), None) => self.upload_lock.lock().await,
        };

        let store = self.store.clone();
        let on_disk = match run_blocking("Manifest read", move || store.manifest()).await {
            Ok(manifest) => manifest,
            Err(err) => {
                if matches!(err, AppError::IndexUnavailable(_)) {
                    *self.loaded.write().await = None;
                }
                return Err(err);
            }
        };

        let mut slot = self.loaded.write().await;
        if let Some(index) = slot
            .as_ref()
            .filter(|index| index.manifest().build_id == on_disk.build_id)
        {
            return Ok(Arc::clone(index));
        }

        if slot.is_some() {
            tracing::info!("Index replaced on disk (build {}), reloading", on_disk.build_id);
        }

        let store = self.store.clone();
        let index = Arc::new(run_blocking("Index load", move || store.load()).await?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Answer a question, returning a typed error on failure.
    ///
    /// History is not touched; see [`DocumentService::ask`].
    pub async fn answer(
        &self,
        query: &str,
        strategy: Option<AnswerStrategy>,
    ) -> AppResult<AnswerOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "No valid query provided".to_string(),
            ));
        }

        let index = self.current_index().await?;
        let strategy = strategy.unwrap_or(self.config.default_strategy);
        self.pipeline.answer(index.as_ref(), query, strategy).await
    }

    /// Ask boundary: always returns a renderable response.
    ///
    /// Successful answers are appended to the history; failures carry an
    /// error payload and leave the history unchanged.
    pub async fn ask(&self, query: &str, strategy: Option<AnswerStrategy>) -> AskResponse {
        match self.answer(query, strategy).await {
            Ok(outcome) => {
                let mut history = self.history.lock().await;
                history.push(AnswerRecord {
                    query: query.trim().to_string(),
                    answer: outcome.answer.clone(),
                });

                AskResponse {
                    success: true,
                    answer: outcome.answer,
                    error: None,
                    previous_responses: history.snapshot(),
                }
            }
            Err(err) => {
                if err.is_client_error() {
                    tracing::warn!("Ask rejected: {}", err);
                } else {
                    tracing::error!("Ask failed: {}", err);
                }

                let answer = match &err {
                    AppError::IndexUnavailable(message) | AppError::InvalidInput(message) => {
                        message.clone()
                    }
                    other => format!("Error processing query: {}", other),
                };

                AskResponse {
                    success: false,
                    answer,
                    error: Some(ErrorPayload::from(&err)),
                    previous_responses: self.history.lock().await.snapshot(),
                }
            }
        }
    }

    pub async fn history(&self) -> Vec<AnswerRecord> {
        self.history.lock().await.snapshot()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    pub fn stats(&self) -> AppResult<IndexStats> {
        self.store.stats()
    }

    /// Remove the persisted index and drop the loaded copy.
    pub async fn clear(&self) -> AppResult<bool> {
        let _guard = self.upload_lock.lock().await;
        *self.loaded.write().await = None;
        let store = self.store.clone();
        run_blocking("Index clear", move || store.clear()).await
    }

    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            index_loaded: self.loaded.read().await.is_some(),
            history_len: self.history.lock().await.len(),
        }
    }
}
