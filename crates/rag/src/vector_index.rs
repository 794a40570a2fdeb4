//! Vector index abstraction.
//!
//! Defines the read side the retriever needs, independent of how vectors are
//! stored.

use docqa_core::AppResult;

/// Trait for searchable vector indexes.
///
/// Positions are indexes into the parallel chunk-text sequence.
pub trait VectorIndex: Send + Sync {
    /// Embedding dimensionality.
    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` `(position, score)` pairs by descending inner product.
    ///
    /// `k` is clamped to the corpus size. Equal scores keep ascending
    /// position.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>>;

    /// Text of the chunk at `position`.
    fn chunk_text(&self, position: usize) -> Option<&str>;
}
