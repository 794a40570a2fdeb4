//! Offline term-overlap reranker.

use super::Reranker;
use crate::embeddings::providers::trigram::content_terms;
use docqa_core::AppResult;
use std::collections::HashSet;

/// Scores a passage by the share of query terms it contains, with a small
/// bonus for how densely those terms occur.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalReranker;

impl LexicalReranker {
    fn score_pair(query: &str, passage: &str) -> f32 {
        let query_terms: HashSet<String> = content_terms(query).into_iter().collect();
        if query_terms.is_empty() {
            return 0.0;
        }

        let passage_terms = content_terms(passage);
        if passage_terms.is_empty() {
            return 0.0;
        }

        let present: HashSet<&String> = passage_terms
            .iter()
            .filter(|t| query_terms.contains(*t))
            .collect();
        let hits = passage_terms
            .iter()
            .filter(|t| query_terms.contains(*t))
            .count();

        let coverage = present.len() as f32 / query_terms.len() as f32;
        let density = hits as f32 / passage_terms.len() as f32;
        coverage + 0.1 * density
    }
}

#[async_trait::async_trait]
impl Reranker for LexicalReranker {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn score(&self, pairs: &[(String, String)]) -> AppResult<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(query, passage)| Self::score_pair(query, passage))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(q: &str, p: &str) -> (String, String) {
        (q.to_string(), p.to_string())
    }

    #[tokio::test]
    async fn test_one_score_per_pair() {
        let pairs = vec![
            pair("capital of France", "The capital of France is Paris."),
            pair("capital of France", "The Eiffel Tower is in Paris."),
            pair("capital of France", ""),
        ];
        let scores = LexicalReranker.score(&pairs).await.unwrap();

        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[2], 0.0);
    }

    #[tokio::test]
    async fn test_stopword_only_query_scores_zero() {
        let scores = LexicalReranker
            .score(&[pair("what is the", "anything at all")])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.0]);
    }
}
