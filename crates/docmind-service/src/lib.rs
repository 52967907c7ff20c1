//! Document QA pipeline: parse, chunk, embed, index, retrieve, answer.
//!
//! [`DocumentService`] is synchronous. Async callers run it on a blocking
//! thread.

pub mod retry;

use std::num::NonZeroUsize;
use std::sync::Arc;

use docmind_answer::prompt::selection_prompt;
use docmind_core::config::AppConfig;
use docmind_core::error::{Error, Result};
use docmind_core::traits::{Embedder, Synthesizer, VectorSearch};
use docmind_core::types::DocId;
use docmind_core::Chunker;
use docmind_index::{DocumentIndex, IndexRegistry, DEFAULT_EMBED_BATCH};

pub use retry::{RetryPolicy, RetryingEmbedder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub doc_id: DocId,
    pub filename: String,
    pub chunks: usize,
}

/// A synthesized response together with the context it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub context: String,
    pub response: String,
}

pub struct DocumentService {
    chunker: Chunker,
    registry: Arc<IndexRegistry>,
    synthesizer: Arc<dyn Synthesizer>,
    top_k: usize,
    embed_batch: usize,
}

impl DocumentService {
    pub fn new(
        chunker: Chunker,
        registry: Arc<IndexRegistry>,
        synthesizer: Arc<dyn Synthesizer>,
        top_k: usize,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::Configuration("retrieval.top_k must be at least 1".into()));
        }
        Ok(Self { chunker, registry, synthesizer, top_k, embed_batch: DEFAULT_EMBED_BATCH })
    }

    /// Chunks sent to the embedder per call while building an index.
    pub fn with_embed_batch(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Configuration("embedding.batch_size must be at least 1".into()));
        }
        self.embed_batch = batch_size;
        Ok(self)
    }

    /// Wire every component from settings. Embedding calls are retried per
    /// `embedding.max_retries`.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let chunker = Chunker::from_config(&cfg.chunking)?;
        let embedder = docmind_embed::embedder_from_config(&cfg.embedding)?;
        let embedder: Arc<dyn Embedder> =
            Arc::new(RetryingEmbedder::new(embedder, RetryPolicy::from_config(&cfg.embedding)));
        let registry = Arc::new(IndexRegistry::new(embedder, NonZeroUsize::new(cfg.registry.capacity)));
        let synthesizer = docmind_answer::synthesizer_from_config(&cfg.synthesizer)?;
        Self::new(chunker, registry, synthesizer, cfg.retrieval.top_k)?.with_embed_batch(cfg.embedding.batch_size)
    }

    pub fn registry(&self) -> &Arc<IndexRegistry> { &self.registry }

    pub fn top_k(&self) -> usize { self.top_k }

    pub fn embed_batch(&self) -> usize { self.embed_batch }

    pub fn synthesizer_name(&self) -> &str { self.synthesizer.name() }

    /// Extract text from an uploaded file and index it under its filename.
    pub fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadOutcome> {
        if filename.trim().is_empty() {
            return Err(Error::InvalidArgument("upload has no filename".into()));
        }
        let text = docmind_parse::extract_text(filename, bytes)?;
        let chunks = self.ingest_text(filename, &text)?;
        tracing::info!(doc_id = filename, bytes = bytes.len(), chunks, "document uploaded");
        Ok(UploadOutcome { doc_id: filename.to_string(), filename: filename.to_string(), chunks })
    }

    /// Chunk, embed and register `text`. Returns the number of chunks.
    pub fn ingest_text(&self, doc_id: &str, text: &str) -> Result<usize> {
        let chunks = self.chunker.split(text, doc_id);
        let index = DocumentIndex::build_batched(chunks, self.registry.embedder().as_ref(), self.embed_batch)?;
        let count = index.len();
        self.registry.register(doc_id, index)?;
        Ok(count)
    }

    pub fn ask(&self, doc_id: &str, query: &str) -> Result<String> {
        Ok(self.answer(doc_id, query)?.response)
    }

    /// Like [`ask`](Self::ask), also returning the retrieved context.
    pub fn answer(&self, doc_id: &str, query: &str) -> Result<Answer> {
        let query = non_blank(query)?;
        let context = self.registry.context_for(doc_id, query, self.top_k)?;
        if context.is_empty() {
            tracing::debug!(doc_id, "no context retrieved");
        }
        let response = self.synthesizer.generate(query, &context)?;
        Ok(Answer { context, response })
    }

    /// Act on a highlighted passage. Retrieval is anchored on the selection,
    /// or on the query when no selection is given.
    pub fn analyze_selection(&self, doc_id: &str, query: &str, selection: Option<&str>) -> Result<String> {
        let query = non_blank(query)?;
        let selection = selection.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(query);
        let context = self.registry.context_for(doc_id, selection, self.top_k)?;
        self.synthesizer.generate(&selection_prompt(selection, query, &context), "")
    }
}

fn non_blank(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("query must not be blank".into()));
    }
    Ok(trimmed)
}
