//! Domain types shared by the chunker, embedders and indices.

use serde::{Deserialize, Serialize};

/// Caller-supplied document identity (the uploaded filename).
pub type DocId = String;

/// Fixed-length embedding. Dimensionality is decided by the embedder.
pub type Vector = Vec<f32>;

/// A contiguous segment of a source document.
///
/// - `text`: exact slice of the source text
/// - `sequence_index`: position within the document, starting at 0
/// - `source_doc_id`: owning document
/// - `start_offset`: character offset of the first character in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub sequence_index: usize,
    pub source_doc_id: DocId,
    pub start_offset: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A chunk paired with its embedding. Owned by the index that built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vector,
}

/// A search result. Higher `score` is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
