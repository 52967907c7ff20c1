//! Flat cosine-similarity index over one document's chunks.

use docmind_core::error::{Error, Result};
use docmind_core::traits::{Embedder, VectorSearch};
use docmind_core::types::{Chunk, DocId, EmbeddedChunk, ScoredChunk, Vector};

pub const DEFAULT_EMBED_BATCH: usize = 32;

/// Immutable once built; rebuilding a document means building a new index.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    doc_id: DocId,
    dim: usize,
    /// Id of the embedder that produced the vectors, when known.
    embedder_id: Option<String>,
    entries: Vec<EmbeddedChunk>,
    norms: Vec<f32>,
}

impl DocumentIndex {
    /// Embed `chunks` with `embedder` and build the index.
    pub fn build<I>(chunks: I, embedder: &dyn Embedder) -> Result<Self>
    where
        I: IntoIterator<Item = Chunk>,
    {
        Self::build_batched(chunks, embedder, DEFAULT_EMBED_BATCH)
    }

    pub fn build_batched<I>(chunks: I, embedder: &dyn Embedder, batch_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = Chunk>,
    {
        let chunks: Vec<Chunk> = chunks.into_iter().collect();
        let Some(first) = chunks.first() else {
            return Err(Error::EmptyIndex);
        };
        let doc_id = first.source_doc_id.clone();
        if let Some(stray) = chunks.iter().find(|c| c.source_doc_id != doc_id) {
            return Err(Error::InvalidArgument(format!(
                "index for '{doc_id}' received a chunk of '{}'",
                stray.source_doc_id
            )));
        }

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = embedder.embed_batch(&texts)?;
            if embedded.len() != texts.len() {
                return Err(Error::Embedding(format!(
                    "{} returned {} vectors for {} chunks",
                    embedder.embedder_id(),
                    embedded.len(),
                    texts.len()
                )));
            }
            vectors.extend(embedded);
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect();
        let index = Self::from_entries(doc_id, embedder.dim(), entries)?.with_embedder_id(embedder.embedder_id());
        tracing::debug!(doc_id = %index.doc_id, chunks = index.len(), dim = index.dim, "index built");
        Ok(index)
    }

    /// An index with no chunks. Searching it yields nothing.
    pub fn empty(doc_id: impl Into<DocId>, dim: usize) -> Self {
        Self { doc_id: doc_id.into(), dim, embedder_id: None, entries: Vec::new(), norms: Vec::new() }
    }

    /// Assemble an index from already-embedded chunks, checking dimensions.
    pub fn from_entries(doc_id: impl Into<DocId>, dim: usize, mut entries: Vec<EmbeddedChunk>) -> Result<Self> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.vector.len() });
        }
        entries.sort_by_key(|e| e.chunk.sequence_index);
        let norms = entries.iter().map(|e| l2_norm(&e.vector)).collect();
        Ok(Self { doc_id: doc_id.into(), dim, embedder_id: None, entries, norms })
    }

    /// Record which embedder produced the vectors.
    #[must_use]
    pub fn with_embedder_id(mut self, embedder_id: impl Into<String>) -> Self {
        self.embedder_id = Some(embedder_id.into());
        self
    }

    pub fn doc_id(&self) -> &str { &self.doc_id }

    pub fn embedder_id(&self) -> Option<&str> { self.embedder_id.as_deref() }

    /// Embedded chunks in sequence order.
    pub fn entries(&self) -> &[EmbeddedChunk] { &self.entries }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

impl VectorSearch for DocumentIndex {
    fn dim(&self) -> usize { self.dim }
    fn len(&self) -> usize { self.entries.len() }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (entry, &norm))| (i, cosine(query, query_norm, &entry.vector, norm)))
            .collect();

        // entries are in sequence order, so the position breaks score ties
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_rank);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Zero-norm vectors score 0 against everything.
fn cosine(query: &[f32], query_norm: f32, vector: &Vector, norm: f32) -> f32 {
    let denom = query_norm * norm;
    if denom <= 0.0 {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(vector).map(|(a, b)| a * b).sum();
    let score = dot / denom;
    if score.is_nan() { 0.0 } else { score }
}
