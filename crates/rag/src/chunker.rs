//! Paragraph-based chunking with bounded, overlapping windows.

use crate::config::ChunkingConfig;
use crate::types::Chunk;
use docqa_core::{AppError, AppResult};
use unicode_segmentation::UnicodeSegmentation;

/// Splits document text into retrieval chunks.
///
/// Text is split on the separator; each unit is trimmed and blank units are
/// dropped. Units are never merged. A unit longer than `chunk_size` grapheme
/// clusters is cut into windows of `chunk_size` that overlap by
/// `chunk_overlap`.
#[derive(Debug, Clone)]
pub struct Chunker {
    separator: String,
    max_chars: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> AppResult<Self> {
        if config.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be > 0".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.separator.is_empty() {
            return Err(AppError::Config("separator cannot be empty".to_string()));
        }

        Ok(Self {
            separator: config.separator.clone(),
            max_chars: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    /// Split text into ordered chunks.
    pub fn split(&self, text: &str) -> AppResult<Vec<Chunk>> {
        let mut chunks = Vec::new();

        for unit in text.split(self.separator.as_str()) {
            let unit = unit.trim();
            if unit.is_empty() {
                continue;
            }

            for window in self.windows(unit) {
                chunks.push(Chunk {
                    text: window,
                    position: chunks.len(),
                });
            }
        }

        if chunks.is_empty() {
            return Err(AppError::EmptyDocument(
                "Document contains no extractable text".to_string(),
            ));
        }

        tracing::debug!(
            "Split {} chars into {} chunks (max {}, overlap {})",
            text.len(),
            chunks.len(),
            self.max_chars,
            self.overlap
        );

        Ok(chunks)
    }

    fn windows(&self, unit: &str) -> Vec<String> {
        let graphemes: Vec<&str> = unit.graphemes(true).collect();
        if graphemes.len() <= self.max_chars {
            return vec![unit.to_string()];
        }

        let step = self.max_chars - self.overlap;
        let mut windows = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.max_chars).min(graphemes.len());
            windows.push(graphemes[start..end].concat());
            if end == graphemes.len() {
                break;
            }
            start += step;
        }

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(&ChunkingConfig {
            separator: "\n\n".to_string(),
            chunk_size: size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_paragraphs_are_not_merged() {
        let text = "The capital of France is Paris.\n\nThe Eiffel Tower is in Paris.";
        let chunks = chunker(200, 10).split(text).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "The capital of France is Paris.");
        assert_eq!(chunks[1].text, "The Eiffel Tower is in Paris.");
        assert_eq!(chunks[1].position, 1);
    }

    #[test]
    fn test_blank_units_are_dropped() {
        let chunks = chunker(200, 10)
            .split("\n\n  first  \n\n\n\n \n\nsecond\n\n")
            .unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_long_unit_windows_overlap_and_reconstruct() {
        let text: String = ('a'..='z').cycle().take(95).collect();
        let chunks = chunker(40, 10).split(&text).unwrap();

        for chunk in &chunks {
            assert!(chunk.text.graphemes(true).count() <= 40);
        }

        // Windows start at 0, 30, 60; the third one reaches the end.
        assert_eq!(chunks.len(), 3);
        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            assert_eq!(&rebuilt[rebuilt.len() - 10..], &chunk.text[..10]);
            rebuilt.push_str(&chunk.text[10..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_windows_respect_grapheme_boundaries() {
        let text = "é🎮".repeat(30);
        let chunks = chunker(25, 5).split(&text).unwrap();
        assert!(chunks.len() > 1);
        for chunk in chunks {
            assert!(chunk.text.graphemes(true).count() <= 25);
        }
    }

    #[test]
    fn test_empty_text_is_empty_document() {
        let err = chunker(200, 10).split(" \n\n \t ").unwrap_err();
        assert_eq!(err.kind(), "empty_document");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ChunkingConfig {
            separator: "\n\n".to_string(),
            chunk_size: 10,
            chunk_overlap: 10,
        };
        assert!(Chunker::new(&config).is_err());
    }
}
