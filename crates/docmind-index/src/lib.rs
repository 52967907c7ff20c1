//! Per-document semantic indices and the registry that owns them.
//!
//! - [`DocumentIndex`]: flat cosine-similarity scan over embedded chunks,
//!   built once and immutable afterwards
//! - [`IndexRegistry`]: `doc_id -> index` map with atomic replacement and an
//!   optional LRU bound
//! - [`assemble_context`]: top-k chunk texts joined into a prompt context
//! - [`IndexSnapshot`]: JSON export/import of a built index

pub mod context;
pub mod index;
pub mod registry;
pub mod snapshot;

pub use context::{assemble_context, CONTEXT_SEPARATOR};
pub use index::{DocumentIndex, DEFAULT_EMBED_BATCH};
pub use registry::IndexRegistry;
pub use snapshot::{IndexSnapshot, SnapshotEntry};
