use docmind_core::error::Result;
use docmind_core::traits::VectorSearch;

/// Separator placed between retrieved chunk texts.
pub const CONTEXT_SEPARATOR: &str = "\n";

/// Top-`k` chunk texts of `index` for `query`, joined in rank order.
pub fn assemble_context(index: &dyn VectorSearch, query: &[f32], k: usize) -> Result<String> {
    let hits = index.search(query, k)?;
    Ok(hits
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR))
}
