//! Embedding backends behind the `docmind_core::Embedder` trait.
//!
//! The backend is picked once from configuration by [`embedder_from_config`]:
//! an in-process BERT encoder (candle), a model-free hashing embedder, or an
//! OpenAI-compatible HTTP endpoint. Any of them can sit behind the LRU cache.

pub mod cache;
mod device;
pub mod hashed;
pub mod model;
mod pool;
pub mod remote;
mod tokenize;

use std::num::NonZeroUsize;
use std::sync::Arc;

use docmind_core::config::{expand_path, EmbeddingBackend, EmbeddingConfig};
use docmind_core::error::{Error, Result};
use docmind_core::traits::Embedder;

pub use cache::{CacheStats, CachedEmbedder};
pub use device::select_device;
pub use hashed::HashedEmbedder;
pub use model::SentenceEncoder;
pub use pool::masked_mean_l2;
pub use remote::RemoteEmbedder;
pub use tokenize::tokenize_batch;

/// Build the configured embedder, wrapped in the cache when
/// `cache_capacity > 0`.
pub fn embedder_from_config(cfg: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let base: Arc<dyn Embedder> = match cfg.backend {
        EmbeddingBackend::Local => {
            let dir = expand_path(&cfg.model_dir);
            let encoder = SentenceEncoder::load(&dir, cfg.max_tokens).map_err(|e| {
                Error::Configuration(format!("cannot load embedding model from {}: {e:#}", dir.display()))
            })?;
            Arc::new(encoder)
        }
        EmbeddingBackend::Hashed => Arc::new(HashedEmbedder::new(cfg.dimension)?),
        EmbeddingBackend::Remote => Arc::new(RemoteEmbedder::new(cfg)?),
    };
    if base.dim() != cfg.dimension {
        return Err(Error::DimensionMismatch { expected: cfg.dimension, actual: base.dim() });
    }
    tracing::info!(embedder = base.embedder_id(), dim = base.dim(), "embedder ready");

    Ok(match NonZeroUsize::new(cfg.cache_capacity) {
        Some(capacity) => Arc::new(CachedEmbedder::new(base, capacity)),
        None => base,
    })
}
