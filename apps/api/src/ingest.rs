//! Résumé text extraction for uploaded files.
//!
//! PDFs go through `pdf-extract`; plain text and Markdown are read as UTF-8.
//! Word documents and other formats are refused rather than guessed at.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type '{0}' (expected .pdf, .txt or .md)")]
    Unsupported(String),

    #[error("failed to extract PDF text: {0}")]
    Pdf(String),

    #[error("file is not valid UTF-8 text")]
    NotUtf8,

    #[error("no text found in '{0}'")]
    Empty(String),
}

/// Extracts plain text from an uploaded résumé. CPU-bound for PDFs; call from
/// `spawn_blocking` in async contexts.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        "txt" | "md" => String::from_utf8(bytes.to_vec()).map_err(|_| ExtractionError::NotUtf8)?,
        "" => return Err(ExtractionError::Unsupported(file_name.to_string())),
        other => return Err(ExtractionError::Unsupported(other.to_string())),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::Empty(file_name.to_string()));
    }
    Ok(text.to_string())
}
