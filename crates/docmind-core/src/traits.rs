use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ScoredChunk, Vector};

/// Maps text to fixed-length vectors.
///
/// Implementations must be deterministic for a fixed model and return one
/// vector per input, in input order. Backend failures surface as
/// [`Error::Embedding`] and are never retried here.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `hashed:d384`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;

    fn embed(&self, text: &str) -> Result<Vector> {
        let mut out = self.embed_batch(&[text.to_string()])?;
        let returned = out.len();
        match out.pop() {
            Some(v) if returned == 1 => Ok(v),
            _ => Err(Error::Embedding(format!(
                "{} returned {returned} vectors for a single input",
                self.embedder_id()
            ))),
        }
    }
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn embedder_id(&self) -> &str { (**self).embedder_id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> { (**self).embed_batch(texts) }
    fn embed(&self, text: &str) -> Result<Vector> { (**self).embed(text) }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embedder_id(&self) -> &str { (**self).embedder_id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> { (**self).embed_batch(texts) }
    fn embed(&self, text: &str) -> Result<Vector> { (**self).embed(text) }
}

/// Nearest-neighbour lookup over one document's embedded chunks.
pub trait VectorSearch: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Top `k` chunks by descending similarity; `k == 0` is rejected.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;
}

/// Turns a prompt plus retrieved context into an answer.
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str, context: &str) -> Result<String>;
}
