//! Reranker backed by a text-embeddings-inference style `/rerank` service.
//!
//! Request: `{"query": "...", "texts": ["..."]}`.
//! Response: `[{"index": 0, "score": 0.93}, ...]` in any order.

use super::Reranker;
use docqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    query: &'a str,
    texts: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f32,
}

#[derive(Debug, Clone)]
pub struct HttpReranker {
    client: Client,
    url: String,
    model: String,
}

impl HttpReranker {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("{}/rerank", endpoint.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    async fn score_query(&self, query: &str, passages: &[&str]) -> AppResult<Vec<f32>> {
        let request = RerankRequest {
            model: (!self.model.is_empty()).then_some(self.model.as_str()),
            query,
            texts: passages.to_vec(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamModel(format!("Rerank request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::UpstreamModel(format!(
                "Rerank API error ({}): {}",
                status, body
            )));
        }

        let hits: Vec<RerankHit> = response.json().await.map_err(|e| {
            AppError::UpstreamModel(format!("Failed to parse rerank response: {}", e))
        })?;

        scores_in_order(hits, passages.len())
    }
}

/// Place scores back in request order; every index must appear once.
fn scores_in_order(hits: Vec<RerankHit>, expected: usize) -> AppResult<Vec<f32>> {
    let mut scores: Vec<Option<f32>> = vec![None; expected];
    for hit in hits {
        let slot = scores
            .get_mut(hit.index)
            .filter(|slot| slot.is_none())
            .ok_or_else(|| {
                AppError::UpstreamModel(format!(
                    "Rerank response has invalid index {}",
                    hit.index
                ))
            })?;
        *slot = Some(hit.score);
    }

    scores
        .into_iter()
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| {
            AppError::UpstreamModel(format!("Rerank response is missing scores for {} texts", expected))
        })
}

#[async_trait::async_trait]
impl Reranker for HttpReranker {
    fn name(&self) -> &str {
        "http"
    }

    #[tracing::instrument(skip(self, pairs), fields(pairs = pairs.len()))]
    async fn score(&self, pairs: &[(String, String)]) -> AppResult<Vec<f32>> {
        let mut scores = Vec::with_capacity(pairs.len());
        let mut start = 0;

        // One request per run of pairs sharing a query.
        while start < pairs.len() {
            let query = &pairs[start].0;
            let end = pairs[start..]
                .iter()
                .position(|(q, _)| q != query)
                .map_or(pairs.len(), |offset| start + offset);

            let passages: Vec<&str> = pairs[start..end].iter().map(|(_, p)| p.as_str()).collect();
            scores.extend(self.score_query(query, &passages).await?);
            start = end;
        }

        Ok(scores)
    }
}
