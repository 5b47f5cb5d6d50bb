//! Metadata extraction collaborator and the directory batch built on top of it.

pub mod batch;
pub mod client;

pub use batch::{BatchError, BatchExtractor, BatchSummary};
pub use client::{HttpMetadataClient, MetadataClientError, MetadataExtractor};

/// Flat field mapping returned by the metadata extraction service.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
