//! Plain-text extraction for uploaded documents.
//!
//! The format is chosen from the file extension (case-insensitive). Only
//! the extracted text leaves this crate; the retrieval core never sees bytes.

mod office;
mod spreadsheet;

use std::fmt;
use std::path::Path;

use docmind_core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Text,
}

impl DocumentFormat {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 5] = ["pdf", "docx", "txt", "pptx", "xlsx"];

    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            "xlsx" => Ok(Self::Xlsx),
            "txt" => Ok(Self::Text),
            _ => Err(Error::UnsupportedFormat(format!(
                "'{filename}' (supported: {})",
                Self::SUPPORTED_EXTENSIONS.join(", ")
            ))),
        }
    }

    pub fn is_supported(filename: &str) -> bool {
        Self::from_filename(filename).is_ok()
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
            Self::Text => "txt",
        };
        f.write_str(name)
    }
}

/// Extract the text of `bytes`, interpreting them according to `filename`.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String> {
    let format = DocumentFormat::from_filename(filename)?;
    let text = match format {
        DocumentFormat::Text => String::from_utf8_lossy(bytes).into_owned(),
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| Error::Parse(format!("{filename}: {e}")))?,
        DocumentFormat::Docx => office::docx_text(bytes).map_err(|e| prefix(filename, e))?,
        DocumentFormat::Pptx => office::pptx_text(bytes).map_err(|e| prefix(filename, e))?,
        DocumentFormat::Xlsx => spreadsheet::xlsx_text(bytes).map_err(|e| prefix(filename, e))?,
    };
    tracing::debug!(filename, %format, chars = text.chars().count(), "text extracted");
    Ok(text)
}

fn prefix(filename: &str, err: Error) -> Error {
    match err {
        Error::Parse(msg) => Error::Parse(format!("{filename}: {msg}")),
        other => other,
    }
}
