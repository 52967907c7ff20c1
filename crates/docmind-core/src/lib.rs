//! Shared vocabulary of the document QA pipeline.
//!
//! Holds the chunk/vector data model, the error taxonomy, the capability
//! traits (`Embedder`, `VectorSearch`, `Synthesizer`), the text chunker and
//! the Figment-backed configuration loader (`config.toml` +
//! `config.<env>.toml` + `APP_*` env vars).
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, Chunks};
pub use error::{Error, Result};
pub use traits::{Embedder, Synthesizer, VectorSearch};
pub use types::{Chunk, DocId, EmbeddedChunk, ScoredChunk, Vector};
