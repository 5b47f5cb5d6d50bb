//! PDF reader built on `lopdf` (structure) and `pdf-extract` (text layer).

use super::types::{DocumentStats, ExtractionResult, ReadIssue};
use lopdf::{Document, Object, ObjectId};
use std::panic::{self, AssertUnwindSafe};

const PDF_SIGNATURE: &[u8] = b"%PDF-";
const ENCRYPT_MARKER: &[u8] = b"/Encrypt";

/// Reads PDF documents into text and structural statistics.
///
/// Never fails: unreadable input degrades to an empty [`ExtractionResult`] tagged with the
/// [`ReadIssue`] that caused it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfHandler;

impl PdfHandler {
    /// Extract text and statistics from raw PDF bytes.
    pub fn process(&self, bytes: &[u8]) -> ExtractionResult {
        let header = &bytes[..bytes.len().min(PDF_SIGNATURE.len())];
        if header != PDF_SIGNATURE {
            tracing::debug!("Missing PDF signature");
            return ExtractionResult::degraded(ReadIssue::BadSignature, 0);
        }

        let size = bytes.len() as u64;
        let document = match Document::load_mem(bytes) {
            Ok(document) => document,
            Err(error) if contains_marker(bytes, ENCRYPT_MARKER) => {
                tracing::debug!(%error, "Encrypted PDF could not be opened");
                return ExtractionResult::degraded(ReadIssue::Encrypted, size);
            }
            Err(error) => {
                tracing::debug!(%error, "Failed to parse PDF structure");
                return ExtractionResult::degraded(ReadIssue::Corrupt, 0);
            }
        };

        if document.trailer.get(b"Encrypt").is_ok() {
            tracing::debug!("PDF is encrypted");
            return ExtractionResult::degraded(ReadIssue::Encrypted, size);
        }

        let pages = document.get_pages();
        let has_images = pages
            .values()
            .any(|page_id| page_has_xobjects(&document, *page_id));

        // pdf-extract panics on some malformed content streams
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));
        let page_texts = match extracted {
            Ok(Ok(page_texts)) => page_texts,
            Ok(Err(error)) => {
                tracing::debug!(%error, "Failed to extract PDF text layer");
                return ExtractionResult::degraded(ReadIssue::Corrupt, 0);
            }
            Err(_) => {
                tracing::warn!("PDF text extraction panicked");
                return ExtractionResult::degraded(ReadIssue::Corrupt, 0);
            }
        };

        let text = page_texts
            .into_iter()
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(
            num_pages = pages.len(),
            bytes = size,
            has_images,
            text_chars = text.chars().count(),
            "Read PDF"
        );

        ExtractionResult {
            text,
            stats: DocumentStats {
                num_pages: pages.len(),
                bytes: size,
                has_images,
                read_error: None,
            },
        }
    }
}

fn contains_marker(bytes: &[u8], marker: &[u8]) -> bool {
    bytes.windows(marker.len()).any(|window| window == marker)
}

fn page_has_xobjects(document: &Document, page_id: ObjectId) -> bool {
    let Ok(page) = document.get_dictionary(page_id) else {
        return false;
    };
    let resources = match page.get(b"Resources") {
        Ok(Object::Dictionary(dict)) => Some(dict),
        Ok(Object::Reference(id)) => document.get_dictionary(*id).ok(),
        _ => None,
    };
    resources.is_some_and(|dict| dict.has(b"XObject"))
}
