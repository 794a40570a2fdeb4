//! Relevance scoring of (query, passage) pairs.

pub mod http;
pub mod lexical;

pub use http::HttpReranker;
pub use lexical::LexicalReranker;

use crate::config::RerankerConfig;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for rerankers.
///
/// `score` returns exactly one score per pair, in pair order; higher means
/// more relevant.
#[async_trait::async_trait]
pub trait Reranker: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn score(&self, pairs: &[(String, String)]) -> AppResult<Vec<f32>>;
}

/// Create a reranker based on configuration.
pub fn create_reranker(config: &RerankerConfig, timeout: Duration) -> AppResult<Arc<dyn Reranker>> {
    match config.provider.as_str() {
        "lexical" => Ok(Arc::new(LexicalReranker)),
        "http" => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("The http reranker requires reranker.endpoint".to_string())
            })?;
            Ok(Arc::new(HttpReranker::new(endpoint, &config.model, timeout)?))
        }
        _ => Err(AppError::Config(format!(
            "Unknown reranker provider: '{}'. Supported providers: lexical, http",
            config.provider
        ))),
    }
}
