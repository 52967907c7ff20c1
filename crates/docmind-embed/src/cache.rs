//! In-memory embedding cache keyed by `(embedder_id, content_hash)`.
//!
//! Consulted before calling the wrapped embedder and written through on
//! misses. Bounded by an LRU so long-running servers do not grow without limit.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

use docmind_core::error::{Error, Result};
use docmind_core::traits::Embedder;
use docmind_core::types::Vector;

pub struct CachedEmbedder<E> {
    inner: E,
    entries: Mutex<LruCache<blake3::Hash, Vector>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }

    fn content_hash(&self, text: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.inner.embedder_id().as_bytes());
        hasher.update(&[0]);
        hasher.update(text.as_bytes());
        hasher.finalize()
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let keys: Vec<blake3::Hash> = texts.iter().map(|t| self.content_hash(t)).collect();
        let mut found: Vec<Option<Vector>> = {
            let mut entries = self.entries.lock();
            keys.iter().map(|k| entries.get(k).cloned()).collect()
        };

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| found[i].is_none()).collect();
        let hit_count = (texts.len() - missing.len()) as u64;
        self.hits.fetch_add(hit_count, Ordering::Relaxed);
        self.misses.fetch_add(missing.len() as u64, Ordering::Relaxed);

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&batch)?;
            if fresh.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "{} returned {} vectors for {} inputs",
                    self.inner.embedder_id(),
                    fresh.len(),
                    batch.len()
                )));
            }
            let mut entries = self.entries.lock();
            for (&i, vector) in missing.iter().zip(fresh) {
                entries.put(keys[i], vector.clone());
                found[i] = Some(vector);
            }
        }

        Ok(found.into_iter().flatten().collect())
    }
}
