#![deny(missing_docs)]

//! Document quality assessment: structural scoring, metadata extraction and topic relevance.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Document readers and declared document types.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Remote metadata extraction and directory batches.
pub mod metadata;
/// Typology classification, structural scoring and the assessment orchestrator.
pub mod quality;
/// Topic model loading and matching.
pub mod topics;
