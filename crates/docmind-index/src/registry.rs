//! Process-wide `doc_id -> index` store.
//!
//! Indices are built outside the lock and swapped in whole, so a reader sees
//! either the previous or the new index for a document, never a mix. Readers
//! clone the `Arc` and search without holding the lock.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use docmind_core::error::{Error, Result};
use docmind_core::traits::{Embedder, VectorSearch};
use docmind_core::types::DocId;

use crate::context::assemble_context;
use crate::index::DocumentIndex;

pub struct IndexRegistry {
    embedder: Arc<dyn Embedder>,
    entries: Mutex<LruCache<DocId, Arc<DocumentIndex>>>,
}

impl IndexRegistry {
    /// `capacity` of `None` keeps every registered index.
    pub fn new(embedder: Arc<dyn Embedder>, capacity: Option<NonZeroUsize>) -> Self {
        let entries = match capacity {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self { embedder, entries: Mutex::new(entries) }
    }

    pub fn unbounded(embedder: Arc<dyn Embedder>) -> Self {
        Self::new(embedder, None)
    }

    /// Embedder used for queries; indices must be built with the same one.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Store `index` under `doc_id`, replacing any previous index.
    ///
    /// Indices built by a different embedder are rejected.
    pub fn register(&self, doc_id: impl Into<DocId>, index: DocumentIndex) -> Result<()> {
        let doc_id = doc_id.into();
        if index.dim() != self.embedder.dim() {
            return Err(Error::DimensionMismatch { expected: self.embedder.dim(), actual: index.dim() });
        }
        if let Some(built_with) = index.embedder_id().filter(|id| *id != self.embedder.embedder_id()) {
            return Err(Error::InvalidArgument(format!(
                "index for '{doc_id}' was built with '{built_with}', queries use '{}'",
                self.embedder.embedder_id()
            )));
        }
        let chunks = index.len();
        let evicted = {
            let mut entries = self.entries.lock();
            let replaced = entries.contains(&doc_id);
            let evicted = entries.push(doc_id.clone(), Arc::new(index));
            if replaced { None } else { evicted }
        };
        if let Some((old_id, _)) = evicted {
            tracing::info!(doc_id = %old_id, "index evicted (capacity reached)");
        }
        tracing::info!(doc_id = %doc_id, chunks, "index registered");
        Ok(())
    }

    pub fn get(&self, doc_id: &str) -> Result<Arc<DocumentIndex>> {
        self.entries
            .lock()
            .get(doc_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no index for document '{doc_id}'")))
    }

    /// Drop the index for `doc_id`; returns whether one was present.
    pub fn evict(&self, doc_id: &str) -> bool {
        let removed = self.entries.lock().pop(doc_id).is_some();
        if removed {
            tracing::info!(doc_id, "index evicted");
        }
        removed
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.entries.lock().contains(doc_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered ids, most recently used first.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.entries.lock().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Top-`k` chunk texts for `query`, newline-joined.
    ///
    /// Unknown documents yield an empty string rather than an error.
    pub fn context_for(&self, doc_id: &str, query: &str, k: usize) -> Result<String> {
        let index = match self.get(doc_id) {
            Ok(index) => index,
            Err(Error::NotFound(_)) => {
                tracing::debug!(doc_id, "context requested for unknown document");
                return Ok(String::new());
            }
            Err(e) => return Err(e),
        };
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        let query_vector = self.embedder.embed(query)?;
        assemble_context(&*index, &query_vector, k)
    }
}
