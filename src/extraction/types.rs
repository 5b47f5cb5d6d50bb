//! Data produced by the document readers.

use serde::Serialize;

/// Why a reader fell back to an empty extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadIssue {
    /// The leading bytes do not carry the expected file signature.
    BadSignature,
    /// The document structure could not be parsed.
    Corrupt,
    /// The document is encrypted and its text is not accessible.
    Encrypted,
}

/// Structural statistics gathered while reading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    /// Number of pages in the document (0 when unreadable).
    pub num_pages: usize,
    /// Size of the document in bytes (0 when the signature check failed).
    pub bytes: u64,
    /// Whether any page references embedded XObjects.
    pub has_images: bool,
    /// Set when the reader degraded to an empty extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<ReadIssue>,
}

/// Text and statistics extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Extracted text, pages joined by newlines.
    pub text: String,
    /// Structural statistics.
    pub stats: DocumentStats,
}

impl ExtractionResult {
    /// Empty extraction returned for unreadable input.
    pub fn degraded(issue: ReadIssue, bytes: u64) -> Self {
        Self {
            text: String::new(),
            stats: DocumentStats {
                num_pages: 0,
                bytes,
                has_images: false,
                read_error: Some(issue),
            },
        }
    }
}
