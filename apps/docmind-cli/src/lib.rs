//! Helpers shared by the `docmind-index` and `docmind-ask` binaries.

use std::path::{Path, PathBuf};

use docmind_parse::DocumentFormat;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Log to stderr; `RUST_LOG` overrides the configured level.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Supported documents under `root`, sorted. A file path is returned as-is
/// when its format is supported.
pub fn collect_documents(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return if DocumentFormat::is_supported(&root.to_string_lossy()) { vec![root.to_path_buf()] } else { Vec::new() };
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| DocumentFormat::is_supported(&p.to_string_lossy()))
        .collect();
    files.sort();
    files
}

/// Document id for `path`: its path relative to `root`, with `/` separators.
pub fn doc_id_for(root: &Path, path: &Path) -> String {
    let rel = if root.is_file() { path.file_name().map(Path::new).unwrap_or(path) } else { path.strip_prefix(root).unwrap_or(path) };
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Snapshot file name for a document id.
pub fn snapshot_file_name(doc_id: &str) -> String {
    format!("{}.json", doc_id.replace(['/', '\\'], "__"))
}
