//! Document reading: raw bytes to extracted text and structural statistics.

pub mod pdf;
pub mod registry;
pub mod types;

pub use pdf::PdfHandler;
pub use registry::{DocType, DocTypeError, DocumentHandler};
pub use types::{DocumentStats, ExtractionResult, ReadIssue};
