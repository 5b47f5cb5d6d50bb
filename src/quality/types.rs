//! Verdict and report types produced by the quality assessment.

use crate::extraction::DocumentStats;
use crate::metadata::Metadata;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Check name mapped to a human-readable reason.
pub type Diagnostics = BTreeMap<String, String>;

/// Coarse document genre driving typology-specific thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Typology {
    /// Scientific or technical paper.
    Scientific,
    /// Policy brief or practice abstract.
    Brief,
    /// Newsletter or event material.
    Promo,
    /// Project deliverable, guide or training material.
    ProjectDeliverable,
    /// Long project report or book.
    ProjectReport,
    /// Short flyer without recognisable keywords.
    PromotionalFlyer,
    /// No typology matched.
    Unknown,
}

impl Typology {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Scientific => "scientific / technical paper",
            Self::Brief => "policy brief / practice abstract",
            Self::Promo => "promotional / newsletter",
            Self::ProjectDeliverable => "project deliverable",
            Self::ProjectReport => "project report",
            Self::PromotionalFlyer => "promotional / flyer",
            Self::Unknown => "unknown",
        }
    }

    /// Typologies expected to carry long-form text.
    pub fn is_long_form(self) -> bool {
        matches!(
            self,
            Self::Scientific | Self::ProjectReport | Self::ProjectDeliverable
        )
    }
}

impl fmt::Display for Typology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Title and subtitle found near the top of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Headers {
    /// First non-noise line of plausible title length.
    pub title: Option<String>,
    /// Line immediately following the title, when it is not noise.
    pub subtitle: Option<String>,
}

/// Reader statistics enriched with scoring inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureStats {
    /// Statistics reported by the reader.
    #[serde(flatten)]
    pub document: DocumentStats,
    /// Typology assigned by the classifier.
    #[serde(rename = "type")]
    pub typology: Typology,
    /// Character count of the cleaned text.
    pub text_len: usize,
    /// Mean characters per line, rounded to two decimals.
    pub avg_line_len: f64,
    /// Number of lines in the cleaned text, blank lines included.
    pub num_lines: usize,
    /// Extracted title and subtitle.
    pub headers: Headers,
}

/// Structural part of the quality report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureReport {
    /// Failed or flagged checks.
    pub diagnose: Diagnostics,
    /// Enriched statistics.
    pub stats: StructureStats,
    /// Final structural score (0 when a hard override fired).
    pub score: f64,
}

/// One topic assigned to a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCandidate {
    /// Topic identifier; `-1` marks outliers.
    pub topic_id: i64,
    /// Display name of the topic.
    pub topic_name: String,
    /// Similarity between the document and the topic; absent on the synthetic outlier entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// Sentinel id reported for documents without a confident topic.
pub const OUTLIER_TOPIC_ID: i64 = -1;

impl TopicCandidate {
    /// Synthetic entry reported when no topic survives filtering.
    pub fn outliers() -> Self {
        Self {
            topic_id: OUTLIER_TOPIC_ID,
            topic_name: "OUTLIERS".to_string(),
            probability: None,
        }
    }
}

/// Semantic part of the quality report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicReport {
    /// Assigned topics ordered by descending similarity.
    pub topics: Vec<TopicCandidate>,
    /// Reason the topic stage could not run normally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnose: Option<String>,
}

impl TopicReport {
    /// Report for a document that matched no topic.
    pub fn outliers(diagnose: Option<String>) -> Self {
        Self {
            topics: vec![TopicCandidate::outliers()],
            diagnose,
        }
    }
}

/// Full quality report for an assessable document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Structural diagnosis.
    pub structure: StructureReport,
    /// Metadata returned by the extraction service; empty when the stage did not run.
    pub metadata: Metadata,
    /// Topic assignment; absent when the semantic stage did not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<TopicReport>,
}

/// Outcome of assessing one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QualityVerdict {
    /// No reader exists for the declared type.
    Unsupported {
        /// Always `false`.
        valid: bool,
        /// Reason, e.g. `unsupported file type: ppt`.
        diagnose: String,
    },
    /// The document went through the assessment pipeline.
    Assessed {
        /// Structural and semantic validity combined.
        valid: bool,
        /// Detailed report.
        quality: Box<QualityReport>,
    },
}

impl QualityVerdict {
    /// Whether the document should be kept.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Unsupported { valid, .. } | Self::Assessed { valid, .. } => *valid,
        }
    }

    /// Detailed report, when the document was assessed.
    pub fn report(&self) -> Option<&QualityReport> {
        match self {
            Self::Assessed { quality, .. } => Some(quality),
            Self::Unsupported { .. } => None,
        }
    }
}
