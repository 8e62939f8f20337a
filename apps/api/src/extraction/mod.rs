//! Plain-text extraction from uploaded documents.
//!
//! Each supported format has its own decoder. Decoders are synchronous and
//! CPU-bound, so [`TextExtractor::extract`] runs them on the blocking pool.

mod docx;
mod legacy;
mod pdf;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type '{0}'")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from document: {0}")]
    ExtractionFailed(String),

    #[error("Insufficient text content extracted from the resume ({found} characters, at least {required} required)")]
    InsufficientContent { found: usize, required: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    LegacyWord,
    Docx,
}

const SUPPORTED_MIME_TYPES: &[(&str, DocumentKind)] = &[
    (MIME_PDF, DocumentKind::Pdf),
    (MIME_DOC, DocumentKind::LegacyWord),
    (MIME_DOCX, DocumentKind::Docx),
];

impl DocumentKind {
    /// Resolves a declared MIME type. Parameters such as `; charset=` are
    /// ignored and the comparison is case-insensitive.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        SUPPORTED_MIME_TYPES
            .iter()
            .find(|(supported, _)| essence.eq_ignore_ascii_case(supported))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ExtractError::UnsupportedFormat(mime.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub async fn extract(&self, bytes: Bytes, mime: &str) -> Result<String, ExtractError> {
        let kind = DocumentKind::from_mime(mime)?;
        debug!(?kind, size = bytes.len(), "Extracting document text");

        let text = tokio::task::spawn_blocking(move || decode(kind, &bytes))
            .await
            .map_err(|e| ExtractError::ExtractionFailed(format!("decoder crashed: {e}")))??;

        Ok(normalize(&text))
    }
}

fn decode(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => pdf::extract_text(bytes),
        DocumentKind::Docx => docx::extract_text(bytes),
        DocumentKind::LegacyWord => legacy::extract_text(bytes),
    }
}

/// Trims trailing whitespace per line and collapses runs of blank lines.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
