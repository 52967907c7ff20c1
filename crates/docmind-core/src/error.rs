use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Cannot build an index from zero chunks")]
    EmptyIndex,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for failures a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Embedding(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
