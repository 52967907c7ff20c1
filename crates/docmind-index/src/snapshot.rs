//! JSON export/import of a built index.
//!
//! Layout: `{doc_id, dimensionality, embedder_id, entries: [{chunk_text,
//! sequence_index, start_offset, vector}]}` with entries in sequence order.
//! `embedder_id` is absent in snapshots written before it was recorded.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use docmind_core::error::{Error, Result};
use docmind_core::traits::VectorSearch;
use docmind_core::types::{Chunk, DocId, EmbeddedChunk, Vector};

use crate::index::DocumentIndex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub doc_id: DocId,
    pub dimensionality: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedder_id: Option<String>,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub chunk_text: String,
    pub sequence_index: usize,
    #[serde(default)]
    pub start_offset: usize,
    pub vector: Vector,
}

impl From<&DocumentIndex> for IndexSnapshot {
    fn from(index: &DocumentIndex) -> Self {
        Self {
            doc_id: index.doc_id().to_string(),
            dimensionality: index.dim(),
            embedder_id: index.embedder_id().map(str::to_string),
            entries: index
                .entries()
                .iter()
                .map(|e| SnapshotEntry {
                    chunk_text: e.chunk.text.clone(),
                    sequence_index: e.chunk.sequence_index,
                    start_offset: e.chunk.start_offset,
                    vector: e.vector.clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<IndexSnapshot> for DocumentIndex {
    type Error = Error;

    fn try_from(snapshot: IndexSnapshot) -> Result<Self> {
        if snapshot.dimensionality == 0 {
            return Err(Error::InvalidArgument("snapshot dimensionality must be positive".into()));
        }
        let doc_id = snapshot.doc_id;
        let entries = snapshot
            .entries
            .into_iter()
            .map(|e| EmbeddedChunk {
                chunk: Chunk {
                    text: e.chunk_text,
                    sequence_index: e.sequence_index,
                    source_doc_id: doc_id.clone(),
                    start_offset: e.start_offset,
                },
                vector: e.vector,
            })
            .collect();
        let index = DocumentIndex::from_entries(doc_id, snapshot.dimensionality, entries)?;
        Ok(match snapshot.embedder_id {
            Some(id) => index.with_embedder_id(id),
            None => index,
        })
    }
}

impl DocumentIndex {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer(&mut writer, &IndexSnapshot::from(self))?;
        writer.flush()?;
        tracing::debug!(doc_id = %self.doc_id(), path = %path.display(), "snapshot written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(fs::File::open(path)?);
        let snapshot: IndexSnapshot = serde_json::from_reader(reader)?;
        Self::try_from(snapshot)
    }
}
