//! Query-time retrieval: embed, search, rerank, truncate.

use crate::config::RetrievalDepth;
use crate::embeddings::Embedder;
use crate::rerank::Reranker;
use crate::types::ScoredPassage;
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Separator between passages in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct Retriever {
    embedder: Embedder,
    reranker: Arc<dyn Reranker>,
}

impl Retriever {
    pub fn new(embedder: Embedder, reranker: Arc<dyn Reranker>) -> Self {
        Self { embedder, reranker }
    }

    /// Return up to `depth.top_k_final` passages ordered by reranker score.
    ///
    /// Candidates with equal scores keep their retrieval order.
    #[tracing::instrument(skip(self, index, query), fields(reranker = self.reranker.name()))]
    pub async fn retrieve(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        depth: RetrievalDepth,
    ) -> AppResult<Vec<ScoredPassage>> {
        let query_embedding = self.embedder.embed_query(query).await?;
        let hits = index.search(&query_embedding, depth.top_k_search)?;

        let candidates: Vec<String> = hits
            .iter()
            .map(|(position, _)| {
                index.chunk_text(*position).map(str::to_string).ok_or_else(|| {
                    AppError::Corruption(format!("No chunk text at position {}", position))
                })
            })
            .collect::<AppResult<_>>()?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<(String, String)> = candidates
            .iter()
            .map(|chunk| (query.to_string(), chunk.clone()))
            .collect();
        let scores = self.reranker.score(&pairs).await?;
        if scores.len() != pairs.len() {
            return Err(AppError::UpstreamModel(format!(
                "Reranker returned {} scores for {} pairs",
                scores.len(),
                pairs.len()
            )));
        }

        let mut passages: Vec<ScoredPassage> = candidates
            .into_iter()
            .zip(scores)
            .map(|(chunk_text, relevance_score)| ScoredPassage {
                chunk_text,
                relevance_score,
            })
            .collect();

        // `sort_by` is stable.
        passages.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        passages.truncate(depth.top_k_final);

        tracing::debug!(
            "Retrieved {} candidates, kept {} (top score: {:?})",
            hits.len(),
            passages.len(),
            passages.first().map(|p| p.relevance_score)
        );

        Ok(passages)
    }

    /// Retrieve and join the passages into one context string.
    pub async fn retrieve_context(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        depth: RetrievalDepth,
    ) -> AppResult<String> {
        let passages = self.retrieve(index, query, depth).await?;
        Ok(join_passages(&passages))
    }
}

pub fn join_passages(passages: &[ScoredPassage]) -> String {
    passages
        .iter()
        .map(|p| p.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingProvider;
    use crate::rerank::LexicalReranker;
    use std::collections::HashSet;

    /// Index whose search returns positions in a fixed order with equal scores.
    struct FixedIndex {
        chunks: Vec<String>,
    }

    impl VectorIndex for FixedIndex {
        fn dimension(&self) -> usize {
            2
        }

        fn len(&self) -> usize {
            self.chunks.len()
        }

        fn search(&self, _query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
            Ok((0..self.chunks.len().min(k)).map(|i| (i, 0.5)).collect())
        }

        fn chunk_text(&self, position: usize) -> Option<&str> {
            self.chunks.get(position).map(String::as_str)
        }
    }

    #[derive(Debug)]
    struct UnitProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for UnitProvider {
        fn provider_name(&self) -> &str {
            "unit"
        }
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    /// Scores by passage length, or returns a fixed number of scores.
    #[derive(Debug)]
    struct ScriptedReranker {
        short_count: Option<usize>,
        constant: bool,
    }

    #[async_trait::async_trait]
    impl Reranker for ScriptedReranker {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn score(&self, pairs: &[(String, String)]) -> AppResult<Vec<f32>> {
            let n = self.short_count.unwrap_or(pairs.len());
            Ok(pairs
                .iter()
                .take(n)
                .map(|(_, p)| if self.constant { 1.0 } else { p.len() as f32 })
                .collect())
        }
    }

    fn index(texts: &[&str]) -> FixedIndex {
        FixedIndex {
            chunks: texts.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn retriever(reranker: ScriptedReranker) -> Retriever {
        Retriever::new(Embedder::new(Arc::new(UnitProvider), 8), Arc::new(reranker))
    }

    fn depth(search: usize, last: usize) -> RetrievalDepth {
        RetrievalDepth {
            top_k_search: search,
            top_k_final: last,
        }
    }

    #[tokio::test]
    async fn test_reranked_descending_and_truncated() {
        let index = index(&["bb", "a", "dddd", "ccc"]);
        let retriever = retriever(ScriptedReranker {
            short_count: None,
            constant: false,
        });

        let passages = retriever.retrieve(&index, "q", depth(10, 3)).await.unwrap();
        let texts: Vec<&str> = passages.iter().map(|p| p.chunk_text.as_str()).collect();
        assert_eq!(texts, vec!["dddd", "ccc", "bb"]);
    }

    #[tokio::test]
    async fn test_candidate_set_is_preserved() {
        let index = index(&["x", "yy", "zzz"]);
        let retriever = retriever(ScriptedReranker {
            short_count: None,
            constant: false,
        });

        let passages = retriever.retrieve(&index, "q", depth(3, 10)).await.unwrap();
        let got: HashSet<&str> = passages.iter().map(|p| p.chunk_text.as_str()).collect();
        assert_eq!(got, HashSet::from(["x", "yy", "zzz"]));
    }

    #[tokio::test]
    async fn test_ties_keep_retrieval_order() {
        let index = index(&["first", "second", "third"]);
        let retriever = retriever(ScriptedReranker {
            short_count: None,
            constant: true,
        });

        let context = retriever
            .retrieve_context(&index, "q", depth(3, 3))
            .await
            .unwrap();
        assert_eq!(context, "first\n\nsecond\n\nthird");
    }

    #[tokio::test]
    async fn test_score_count_mismatch_is_upstream_error() {
        let index = index(&["a", "b"]);
        let retriever = retriever(ScriptedReranker {
            short_count: Some(1),
            constant: false,
        });

        let err = retriever.retrieve(&index, "q", depth(2, 2)).await.unwrap_err();
        assert_eq!(err.kind(), "upstream_model");
    }

    #[tokio::test]
    async fn test_lexical_reranker_prefers_matching_passage() {
        let index = index(&["The Eiffel Tower is in Paris.", "The capital of France is Paris."]);
        let retriever = Retriever::new(
            Embedder::new(Arc::new(UnitProvider), 8),
            Arc::new(LexicalReranker),
        );

        let passages = retriever
            .retrieve(&index, "What is the capital of France?", depth(2, 1))
            .await
            .unwrap();
        assert_eq!(passages[0].chunk_text, "The capital of France is Paris.");
    }
}
