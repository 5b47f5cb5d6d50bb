//! Idempotent metadata extraction over a directory of PDF files.
//!
//! Each document is assessed and a `<file name>.json` record is written to the valid or invalid
//! output directory. Documents that already have a record in either directory are skipped, so
//! an interrupted run can simply be restarted.

use crate::extraction::DocType;
use crate::quality::{QualityAssessment, QualityVerdict};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use walkdir::WalkDir;

/// Errors that abort a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Directory could not be created or listed, or a record could not be written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Input directory could not be traversed.
    #[error("failed to list {path}: {source}")]
    Walk {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying traversal failure.
        #[source]
        source: walkdir::Error,
    },
    /// Record could not be serialised.
    #[error("failed to serialise record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Counters reported at the end of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// PDF files selected for processing.
    pub discovered: usize,
    /// Files skipped because a record already exists.
    pub skipped: usize,
    /// Records written to the valid directory.
    pub valid: usize,
    /// Records written to the invalid directory.
    pub invalid: usize,
    /// Files that could not be read.
    pub failed: usize,
}

/// Batch driver around a [`QualityAssessment`] engine.
pub struct BatchExtractor<'a> {
    engine: &'a QualityAssessment,
}

impl<'a> BatchExtractor<'a> {
    /// Wrap an engine.
    pub fn new(engine: &'a QualityAssessment) -> Self {
        Self { engine }
    }

    /// Assess every PDF in `input_dir` and write one record per document.
    ///
    /// With `limit` set, only the first `limit` files in name order are considered.
    pub async fn extract_all(
        &self,
        input_dir: &Path,
        valid_dir: &Path,
        invalid_dir: &Path,
        limit: Option<usize>,
    ) -> Result<BatchSummary, BatchError> {
        create_dir(valid_dir)?;
        create_dir(invalid_dir)?;

        let mut files = list_pdfs(input_dir)?;
        tracing::info!(
            input = %input_dir.display(),
            files = files.len(),
            "Processing documents"
        );
        if let Some(limit) = limit.filter(|limit| *limit > 0 && *limit < files.len()) {
            tracing::info!(limit, available = files.len(), "Limiting batch");
            files.truncate(limit);
        }

        let mut summary = BatchSummary {
            discovered: files.len(),
            ..BatchSummary::default()
        };

        for path in files {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let record_name = format!("{file_name}.json");
            if valid_dir.join(&record_name).exists() || invalid_dir.join(&record_name).exists() {
                tracing::debug!(file_name, "Record exists; skipping");
                summary.skipped += 1;
                continue;
            }

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Failed to read document");
                    summary.failed += 1;
                    continue;
                }
            };

            let verdict = self
                .engine
                .validate_named(&bytes, DocType::Pdf, file_name)
                .await;
            let record = build_record(&verdict, &bytes);

            let target = if verdict.is_valid() {
                summary.valid += 1;
                valid_dir
            } else {
                summary.invalid += 1;
                invalid_dir
            };
            write_record(&target.join(&record_name), &record)?;
        }

        tracing::info!(?summary, "Batch finished");
        Ok(summary)
    }
}

/// Flatten a verdict into the persisted record: metadata fields plus structure stats.
pub fn build_record(verdict: &QualityVerdict, bytes: &[u8]) -> Value {
    let mut record = match verdict {
        QualityVerdict::Assessed { quality, valid } => {
            let mut record = quality.metadata.clone();
            record.insert("size".into(), json!(quality.structure.stats));
            record.insert("valid_structure".into(), json!(valid));
            if !valid {
                record.insert("diagnostics".into(), json!(quality.structure.diagnose));
            }
            record
        }
        QualityVerdict::Unsupported { diagnose, .. } => {
            let mut record = serde_json::Map::new();
            record.insert("valid_structure".into(), json!(false));
            record.insert("diagnostics".into(), json!(diagnose));
            record
        }
    };
    record.insert("document_sha256".into(), json!(document_hash(bytes)));
    record.insert("assessed_at".into(), json!(current_timestamp_rfc3339()));
    Value::Object(record)
}

fn list_pdfs(input_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| BatchError::Walk {
            path: input_dir.to_path_buf(),
            source,
        })?;
        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn create_dir(path: &Path) -> Result<(), BatchError> {
    fs::create_dir_all(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a record through a temporary sibling so a partial file never carries the final name.
fn write_record(path: &Path, record: &Value) -> Result<(), BatchError> {
    let body = serde_json::to_string_pretty(record)?;
    let io_error = |source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(io_error)?;
    staged.write_all(body.as_bytes()).map_err(io_error)?;
    staged.persist(path).map_err(|error| io_error(error.error))?;
    Ok(())
}

fn document_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
