//! Character-window text splitter with overlap.
//!
//! Windows are measured in Unicode scalar values. Inside each window the
//! splitter looks for the latest paragraph break, then line/sentence end,
//! then whitespace; a break is only taken when the chunk stays longer than
//! both the overlap and half the window, otherwise the window is hard-cut.

use std::iter::FusedIterator;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be greater than 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { config: ChunkingConfig::default() }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::from_config(&ChunkingConfig { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config: *config })
    }

    pub fn chunk_size(&self) -> usize { self.config.chunk_size }
    pub fn overlap(&self) -> usize { self.config.overlap }

    /// Lazily split `text` into chunks tagged with `doc_id`.
    ///
    /// The returned iterator can be cloned to restart from the same position.
    pub fn split(&self, text: &str, doc_id: &str) -> Chunks {
        Chunks {
            chars: text.chars().collect(),
            doc_id: Arc::from(doc_id),
            chunk_size: self.config.chunk_size,
            overlap: self.config.overlap,
            start: 0,
            sequence_index: 0,
            done: text.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunks {
    chars: Arc<[char]>,
    doc_id: Arc<str>,
    chunk_size: usize,
    overlap: usize,
    start: usize,
    sequence_index: usize,
    done: bool,
}

impl Chunks {
    /// Shortest chunk that may end on a natural boundary.
    fn min_boundary_len(&self) -> usize {
        self.overlap.max(self.chunk_size / 2) + 1
    }

    /// End (exclusive) of the chunk starting at `start`, plus whether a
    /// natural boundary was used.
    fn chunk_end(&self, start: usize) -> (usize, bool) {
        let hard_end = (start + self.chunk_size).min(self.chars.len());
        if hard_end == self.chars.len() {
            return (hard_end, false);
        }
        let lowest = start + self.min_boundary_len();
        if lowest > hard_end {
            return (hard_end, false);
        }
        let breaks: [fn(&[char], usize) -> bool; 3] = [is_paragraph_end, is_sentence_end, is_word_end];
        for is_break in breaks {
            if let Some(end) = (lowest..=hard_end).rev().find(|&e| is_break(&self.chars, e)) {
                return (end, true);
            }
        }
        (hard_end, false)
    }

    fn next_start(&self, start: usize, end: usize, at_boundary: bool) -> usize {
        if self.overlap == 0 {
            return end;
        }
        let candidate = end - self.overlap;
        debug_assert!(candidate > start);
        if !at_boundary {
            return candidate;
        }
        (candidate..end)
            .find(|&i| is_word_start(&self.chars, i))
            .unwrap_or(candidate)
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }
        let start = self.start;
        let (end, at_boundary) = self.chunk_end(start);
        let chunk = Chunk {
            text: self.chars[start..end].iter().collect(),
            sequence_index: self.sequence_index,
            source_doc_id: self.doc_id.to_string(),
            start_offset: start,
        };
        self.sequence_index += 1;
        if end == self.chars.len() {
            self.done = true;
        } else {
            self.start = self.next_start(start, end, at_boundary);
        }
        Some(chunk)
    }
}

impl FusedIterator for Chunks {}

fn is_paragraph_end(chars: &[char], end: usize) -> bool {
    end >= 2 && chars[end - 2] == '\n' && chars[end - 1] == '\n'
}

fn is_sentence_end(chars: &[char], end: usize) -> bool {
    if end >= 1 && chars[end - 1] == '\n' {
        return true;
    }
    end >= 2 && matches!(chars[end - 2], '.' | '!' | '?') && chars[end - 1].is_whitespace()
}

fn is_word_end(chars: &[char], end: usize) -> bool {
    end >= 1 && chars[end - 1].is_whitespace()
}

fn is_word_start(chars: &[char], i: usize) -> bool {
    i > 0 && i < chars.len() && chars[i - 1].is_whitespace() && !chars[i].is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0usize;
        for c in chunks {
            assert!(c.start_offset <= covered, "gap before chunk {}", c.sequence_index);
            out.extend(c.text.chars().skip(covered - c.start_offset));
            covered = c.start_offset + c.char_len();
        }
        out
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(Chunker::new(0, 0), Err(Error::Configuration(_))));
        assert!(matches!(Chunker::new(10, 10), Err(Error::Configuration(_))));
        assert!(matches!(Chunker::new(10, 11), Err(Error::Configuration(_))));
        assert!(Chunker::new(10, 9).is_ok());
        assert!(Chunker::new(1, 0).is_ok());
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(Chunker::default().split("", "d").count(), 0);
    }

    #[test]
    fn hard_cut_without_boundaries() {
        let text = "x".repeat(2500);
        let chunks: Vec<Chunk> = Chunker::new(1000, 200).expect("chunker").split(&text, "doc").collect();
        let offsets: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 800, 1600]);
        assert!(chunks.iter().all(|c| c.char_len() <= 1000));
        assert_eq!(chunks[2].char_len(), 900);
    }

    #[test]
    fn prefers_paragraph_break() {
        let text = format!("{}\n\n{}", "a".repeat(70), "b".repeat(70));
        let chunks: Vec<Chunk> = Chunker::new(100, 10).expect("chunker").split(&text, "doc").collect();
        assert_eq!(chunks[0].text, format!("{}\n\n", "a".repeat(70)));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn ignores_boundary_that_would_make_tiny_chunk() {
        // the only break sits at position 5, well below half the window
        let text = format!("abcd {}", "z".repeat(200));
        let chunks: Vec<Chunk> = Chunker::new(100, 20).expect("chunker").split(&text, "doc").collect();
        assert_eq!(chunks[0].char_len(), 100);
    }

    #[test]
    fn overlap_start_moves_to_word_start() {
        let words = "alpha beta gamma delta epsilon zeta eta theta iota kappa ".repeat(10);
        let chunks: Vec<Chunk> = Chunker::new(60, 15).expect("chunker").split(&words, "doc").collect();
        for c in chunks.iter().skip(1) {
            let first = c.text.chars().next().expect("non-empty chunk");
            assert!(!first.is_whitespace(), "chunk {} starts mid-gap", c.sequence_index);
        }
        assert_eq!(reconstruct(&chunks), words);
    }

    #[test]
    fn multibyte_text_is_sized_in_chars() {
        let text = "é".repeat(30);
        let chunks: Vec<Chunk> = Chunker::new(10, 2).expect("chunker").split(&text, "doc").collect();
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn iterator_is_restartable() {
        let text = "one two three four five six seven eight nine ten ".repeat(20);
        let chunks = Chunker::new(50, 10).expect("chunker").split(&text, "doc");
        let first: Vec<Chunk> = chunks.clone().collect();
        let second: Vec<Chunk> = chunks.collect();
        assert_eq!(first, second);
    }
}
