//! Declared document types and the handlers that read them.

use super::pdf::PdfHandler;
use super::types::ExtractionResult;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised while mapping a file name to a document type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocTypeError {
    /// The file extension does not correspond to any known document type.
    #[error("document quality assessment for '{0}' files is not supported")]
    UnsupportedExtension(String),
}

/// Document types known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// Portable Document Format.
    Pdf,
    /// PowerPoint decks; recognised but not yet assessable.
    #[serde(rename = "ppt")]
    PowerPoint,
}

impl DocType {
    /// Short tag used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PowerPoint => "ppt",
        }
    }

    /// Conventional file extension, used when forwarding the document to collaborators.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PowerPoint => "pptx",
        }
    }

    /// Resolve the document type from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, DocTypeError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "ppt" | "pptx" => Ok(Self::PowerPoint),
            _ => Err(DocTypeError::UnsupportedExtension(extension)),
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reader capable of turning one document type into an [`ExtractionResult`].
///
/// Supporting a new type means adding a variant here and a match arm in
/// [`DocumentHandler::for_type`].
#[derive(Debug, Clone, Copy)]
pub enum DocumentHandler {
    /// PDF reader.
    Pdf(PdfHandler),
}

impl DocumentHandler {
    /// Handler registered for `doc_type`, if any.
    pub fn for_type(doc_type: DocType) -> Option<Self> {
        match doc_type {
            DocType::Pdf => Some(Self::Pdf(PdfHandler)),
            DocType::PowerPoint => None,
        }
    }

    /// Read the document bytes.
    pub fn process(&self, bytes: &[u8]) -> ExtractionResult {
        match self {
            Self::Pdf(handler) => handler.process(bytes),
        }
    }
}
