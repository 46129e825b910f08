//! PDF text extraction for uploaded documents.
//!
//! The gateway only checks the declared type, the size ceiling, and whether any text came out.
//! Byte-level parsing sits behind [`PdfParser`]; the default [`PdfExtractParser`] runs the
//! `pdf-extract` crate on a blocking worker because parsing is CPU-bound.

use std::sync::Arc;
use thiserror::Error;

/// The only MIME type accepted for uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";
/// Largest upload accepted for extraction (10 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Reasons a document could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Declared content type is not a PDF.
    #[error("unsupported media type '{0}'; expected application/pdf")]
    UnsupportedMediaType(String),
    /// Upload exceeds [`MAX_DOCUMENT_BYTES`].
    #[error("document is {size} bytes; the limit is {limit} bytes")]
    PayloadTooLarge {
        /// Observed size in bytes (or the limit that was hit while streaming).
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// The parser could not read the document.
    #[error("document could not be parsed: {0}")]
    Unreadable(String),
    /// Parsing succeeded but produced no text.
    #[error("document contains no extractable text")]
    EmptyDocument,
}

impl ExtractionError {
    /// Stable identifier used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Unreadable(_) => "unreadable_document",
            Self::EmptyDocument => "empty_document",
        }
    }
}

/// Text produced by a parser.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Raw text in reading order.
    pub text: String,
}

/// Byte-level PDF parser.
pub trait PdfParser: Send + Sync {
    /// Parse a complete PDF held in memory.
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, String>;
}

/// Parser backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractParser;

impl PdfParser for PdfExtractParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, String> {
        pdf_extract::extract_text_from_mem(bytes)
            .map(|text| ParsedDocument { text })
            .map_err(|error| error.to_string())
    }
}

/// Validates uploads and runs the configured parser.
#[derive(Clone)]
pub struct DocumentExtractor {
    parser: Arc<dyn PdfParser>,
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(Arc::new(PdfExtractParser))
    }
}

impl DocumentExtractor {
    /// Wrap a parser implementation.
    pub fn new(parser: Arc<dyn PdfParser>) -> Self {
        Self { parser }
    }

    /// Extract normalized text from `bytes` declared as `declared_mime_type`.
    pub async fn extract_text(
        &self,
        bytes: Vec<u8>,
        declared_mime_type: &str,
    ) -> Result<String, ExtractionError> {
        if !is_pdf_mime(declared_mime_type) {
            return Err(ExtractionError::UnsupportedMediaType(
                declared_mime_type.to_string(),
            ));
        }
        if bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(ExtractionError::PayloadTooLarge {
                size: bytes.len(),
                limit: MAX_DOCUMENT_BYTES,
            });
        }

        let size = bytes.len();
        let parser = Arc::clone(&self.parser);
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&bytes))
            .await
            .map_err(|error| {
                tracing::error!(error = %error, "PDF parser task aborted");
                ExtractionError::Unreadable("parser aborted while reading the document".into())
            })?
            .map_err(ExtractionError::Unreadable)?;

        let text = normalize_whitespace(&parsed.text);
        if text.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        tracing::debug!(bytes = size, chars = text.chars().count(), "Extracted document text");
        Ok(text)
    }
}

/// Compare the MIME essence (parameters stripped, case-insensitive) against the PDF type.
pub fn is_pdf_mime(declared: &str) -> bool {
    declared
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME_TYPE))
        .unwrap_or(false)
}

// Collapse runs of spaces inside lines and drop blank lines; PDF extraction tends to emit both.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
