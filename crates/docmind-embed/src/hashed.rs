//! Model-free embedder: signed feature hashing of lowercase word tokens.
//!
//! Texts sharing vocabulary land close together under cosine similarity,
//! which is enough for offline use and for exercising the pipeline in tests.

use std::hash::Hasher;

use twox_hash::XxHash64;

use docmind_core::error::{Error, Result};
use docmind_core::traits::Embedder;
use docmind_core::types::Vector;

pub struct HashedEmbedder {
    dim: usize,
    id: String,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Configuration("hashed embedder needs a non-zero dimension".into()));
        }
        Ok(Self { dim, id: format!("hashed:d{dim}") })
    }

    fn embed_one(&self, text: &str) -> Vector {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let idx = usize::try_from(h % self.dim as u64).unwrap_or(0);
            let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl Embedder for HashedEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
