//! Orchestration of structural validation, metadata extraction and topic matching.

use super::diagnose::diagnose;
use super::rules::{MIN_CHARS_PER_PAGE, MIN_SCORE, SPARSE_GUARD_MIN_PAGES};
use super::types::{QualityReport, QualityVerdict, StructureReport, TopicReport, Typology};
use super::typology::classify;
use crate::config::Config;
use crate::extraction::{DocType, DocumentHandler, ExtractionResult, ReadIssue};
use crate::metadata::{HttpMetadataClient, Metadata, MetadataClientError, MetadataExtractor};
use crate::topics::{EmbeddingTopicMatcher, TopicMatcher};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while constructing the assessment engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Metadata client could not be built.
    #[error("failed to initialise metadata client: {0}")]
    Metadata(#[from] MetadataClientError),
}

/// Structural outcome before the collaborators run.
struct StructuralOutcome {
    is_valid: bool,
    report: StructureReport,
}

/// Quality assessment engine chaining structure, metadata and topic checks.
pub struct QualityAssessment {
    metadata: Arc<dyn MetadataExtractor>,
    topics: Option<Arc<dyn TopicMatcher>>,
    top_k: usize,
}

impl QualityAssessment {
    /// Assemble an engine from explicit collaborators.
    pub fn new(
        metadata: Arc<dyn MetadataExtractor>,
        topics: Option<Arc<dyn TopicMatcher>>,
        top_k: usize,
    ) -> Self {
        Self {
            metadata,
            topics,
            top_k,
        }
    }

    /// Build the engine from configuration.
    ///
    /// A topic model that cannot be loaded is logged and leaves the topic stage unavailable;
    /// it does not prevent construction.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let metadata: Arc<dyn MetadataExtractor> = Arc::new(HttpMetadataClient::new(config)?);
        let topics: Option<Arc<dyn TopicMatcher>> = match EmbeddingTopicMatcher::from_config(config)
        {
            Ok(matcher) => Some(Arc::new(matcher)),
            Err(error) => {
                tracing::error!(
                    %error,
                    path = %config.topic_model_path.display(),
                    "Topic model unavailable; it must be trained and exported first"
                );
                None
            }
        };
        Ok(Self::new(metadata, topics, config.topic_top_k))
    }

    /// Whether a topic model was loaded.
    pub fn has_topic_model(&self) -> bool {
        self.topics.is_some()
    }

    /// Assess a document, forwarding it to the metadata service as `document.<ext>`.
    pub async fn validate(&self, bytes: &[u8], doc_type: DocType) -> QualityVerdict {
        let file_name = format!("document.{}", doc_type.extension());
        self.validate_named(bytes, doc_type, &file_name).await
    }

    /// Assess a document whose original file name is known.
    pub async fn validate_named(
        &self,
        bytes: &[u8],
        doc_type: DocType,
        file_name: &str,
    ) -> QualityVerdict {
        let Some(handler) = DocumentHandler::for_type(doc_type) else {
            tracing::info!(%doc_type, file_name, "No reader for document type");
            return QualityVerdict::Unsupported {
                valid: false,
                diagnose: format!("unsupported file type: {doc_type}"),
            };
        };

        let owned = bytes.to_vec();
        let read = tokio::task::spawn_blocking(move || handler.process(&owned));
        let extraction = match read.await {
            Ok(extraction) => extraction,
            Err(error) => {
                tracing::error!(%error, file_name, "Document reader task failed");
                ExtractionResult::degraded(ReadIssue::Corrupt, 0)
            }
        };
        self.assess_extraction(extraction, bytes, file_name).await
    }

    /// Assess a document that has already been read.
    ///
    /// `bytes` are forwarded to the metadata service when the structure is valid.
    pub async fn assess_extraction(
        &self,
        extraction: ExtractionResult,
        bytes: &[u8],
        file_name: &str,
    ) -> QualityVerdict {
        let StructuralOutcome {
            mut is_valid,
            mut report,
        } = assess_structure(&extraction);

        let mut metadata = Metadata::new();
        if is_valid {
            metadata = self.metadata.extract(bytes, file_name).await;
            if !has_value(&metadata, "title") && !has_value(&metadata, "topic") {
                is_valid = false;
                report.diagnose.insert(
                    "metadata".into(),
                    "structurally valid but [wrt. extracted metadata] semantically invalid".into(),
                );
            }
        }

        let mut topic = None;
        let mut is_sem_valid = false;
        if is_valid {
            let (valid, topic_report) = self.match_topics(&metadata).await;
            is_sem_valid = valid;
            topic = Some(topic_report);
        }

        let valid = is_valid && is_sem_valid;
        tracing::info!(
            file_name,
            typology = %report.stats.typology,
            score = report.score,
            structurally_valid = is_valid,
            valid,
            "Document assessed"
        );

        QualityVerdict::Assessed {
            valid,
            quality: Box::new(QualityReport {
                structure: report,
                metadata,
                topic,
            }),
        }
    }

    async fn match_topics(&self, metadata: &Metadata) -> (bool, TopicReport) {
        match &self.topics {
            Some(matcher) => {
                let result = matcher.match_metadata(metadata, self.top_k).await;
                (result.is_valid, result.report)
            }
            None => (
                false,
                TopicReport::outliers(Some("topic model unavailable".to_string())),
            ),
        }
    }
}

/// Classify, score and apply the hard overrides.
fn assess_structure(extraction: &ExtractionResult) -> StructuralOutcome {
    let typology = classify(&extraction.text, &extraction.stats);
    let diagnosis = diagnose(&extraction.text, &extraction.stats, typology);

    let mut score = diagnosis.score;
    let mut diagnostics = diagnosis.diagnostics;
    let stats = diagnosis.stats;
    let mut is_valid = score >= MIN_SCORE;

    if typology == Typology::Unknown {
        is_valid = false;
        diagnostics.insert("typology_check".into(), "could not match EUFB typology".into());
        score = 0.0;
    }

    let num_pages = stats.document.num_pages;
    let chars_per_page = stats.text_len / num_pages.max(1);
    if num_pages > SPARSE_GUARD_MIN_PAGES && chars_per_page < MIN_CHARS_PER_PAGE {
        is_valid = false;
        diagnostics.insert(
            "content_check".into(),
            "document appears to be empty tables or sparse text".into(),
        );
        score = 0.0;
    }

    StructuralOutcome {
        is_valid,
        report: StructureReport {
            diagnose: diagnostics,
            stats,
            score,
        },
    }
}

/// Whether a metadata field is present and non-empty.
fn has_value(metadata: &Metadata, key: &str) -> bool {
    match metadata.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::DocumentStats;
    use crate::quality::TopicCandidate;
    use crate::topics::TopicMatch;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubMetadata {
        response: Value,
        calls: AtomicUsize,
    }

    impl StubMetadata {
        fn new(response: Value) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MetadataExtractor for StubMetadata {
        async fn extract(&self, _bytes: &[u8], _file_name: &str) -> Metadata {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Value::Object(fields) => fields.clone(),
                _ => Metadata::new(),
            }
        }
    }

    struct StubTopics {
        valid: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TopicMatcher for StubTopics {
        async fn match_text(&self, _text: &str, _top_k: usize) -> TopicMatch {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let topics = if self.valid {
                vec![TopicCandidate {
                    topic_id: 3,
                    topic_name: "Soil carbon".into(),
                    probability: Some(0.8),
                }]
            } else {
                vec![TopicCandidate::outliers()]
            };
            TopicMatch {
                is_valid: self.valid,
                report: TopicReport {
                    topics,
                    diagnose: None,
                },
            }
        }
    }

    fn deliverable(pages: usize) -> ExtractionResult {
        let mut text = String::from(
            "Soil Health Practices Handbook\nA guide for extension officers\n\
             This project has received funding from Horizon Europe.\n",
        );
        let line = "Cover crops and reduced tillage raise soil organic carbon across trial sites.\n";
        while text.chars().count() < 12_000 {
            text.push_str(line);
        }
        ExtractionResult {
            text,
            stats: DocumentStats {
                num_pages: pages,
                bytes: 900_000,
                ..DocumentStats::default()
            },
        }
    }

    fn engine(
        metadata: Arc<StubMetadata>,
        topics: Option<Arc<StubTopics>>,
    ) -> QualityAssessment {
        QualityAssessment::new(
            metadata,
            topics.map(|topics| topics as Arc<dyn TopicMatcher>),
            3,
        )
    }

    fn topics(valid: bool) -> Arc<StubTopics> {
        Arc::new(StubTopics {
            valid,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn valid_document_runs_every_stage() {
        let metadata = StubMetadata::new(json!({ "title": "Soil Health Practices" }));
        let matcher = topics(true);
        let engine = engine(metadata.clone(), Some(matcher.clone()));

        let verdict = engine.assess_extraction(deliverable(20), b"", "d.pdf").await;

        assert!(verdict.is_valid());
        let report = verdict.report().expect("report");
        assert!(report.structure.score >= MIN_SCORE);
        assert_eq!(report.structure.stats.typology, Typology::ProjectDeliverable);
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 1);
        assert_eq!(matcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.topic.as_ref().expect("topic").topics[0].topic_id, 3);
    }

    #[tokio::test]
    async fn unknown_typology_zeroes_score_and_skips_collaborators() {
        let metadata = StubMetadata::new(json!({ "title": "x" }));
        let engine = engine(metadata.clone(), Some(topics(true)));
        let extraction = ExtractionResult {
            text: "Plain words about something\n".repeat(400),
            stats: DocumentStats {
                num_pages: 20,
                bytes: 500_000,
                ..DocumentStats::default()
            },
        };

        let verdict = engine.assess_extraction(extraction, b"", "d.pdf").await;

        assert!(!verdict.is_valid());
        let report = verdict.report().expect("report");
        assert_eq!(report.structure.score, 0.0);
        assert_eq!(
            report.structure.diagnose.get("typology_check").map(String::as_str),
            Some("could not match EUFB typology")
        );
        assert!(report.metadata.is_empty());
        assert!(report.topic.is_none());
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sparse_document_is_rejected() {
        let metadata = StubMetadata::new(json!({ "title": "x" }));
        let engine = engine(metadata.clone(), Some(topics(true)));

        let verdict = engine.assess_extraction(deliverable(100), b"", "d.pdf").await;

        assert!(!verdict.is_valid());
        let report = verdict.report().expect("report");
        assert_eq!(report.structure.score, 0.0);
        assert!(report.structure.diagnose.contains_key("content_check"));
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
    }

    fn short_paper(pages: usize, len: usize) -> ExtractionResult {
        let head = "Crop rotation effects in upland farms\nA three year field comparison\n\
                    Abstract\nMethodology\n";
        let tail = "\nReferences\n[1] Someone, 2020. Rotations in practice.";
        let sentence = "Field trials compared rotations over three seasons. ";
        let filler: String = sentence
            .chars()
            .cycle()
            .take(len - head.len() - tail.len())
            .collect();
        ExtractionResult {
            text: format!("{head}{filler}{tail}"),
            stats: DocumentStats {
                num_pages: pages,
                bytes: 100_000,
                ..DocumentStats::default()
            },
        }
    }

    #[tokio::test]
    async fn two_page_documents_skip_the_sparse_guard() {
        let metadata = StubMetadata::new(json!({ "title": "x" }));
        let engine = engine(metadata, Some(topics(true)));

        let verdict = engine.assess_extraction(short_paper(2, 200), b"", "d.pdf").await;

        let report = verdict.report().expect("report");
        assert_eq!(report.structure.stats.text_len, 200);
        assert!(!report.structure.diagnose.contains_key("content_check"));
        assert!(report.structure.score > 0.0);
    }

    #[tokio::test]
    async fn exactly_minimum_density_passes_the_sparse_guard() {
        let metadata = StubMetadata::new(json!({ "title": "Crop rotation effects" }));
        let engine = engine(metadata.clone(), Some(topics(true)));

        let verdict = engine.assess_extraction(short_paper(3, 600), b"", "d.pdf").await;

        let report = verdict.report().expect("report");
        assert_eq!(report.structure.stats.typology, Typology::Scientific);
        assert_eq!(report.structure.stats.text_len, 600);
        assert!(!report.structure.diagnose.contains_key("content_check"));
        assert!(report.structure.score >= MIN_SCORE);
        assert!(verdict.is_valid());
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn density_just_below_minimum_is_rejected() {
        let metadata = StubMetadata::new(json!({ "title": "Crop rotation effects" }));
        let engine = engine(metadata.clone(), Some(topics(true)));

        let verdict = engine.assess_extraction(short_paper(3, 597), b"", "d.pdf").await;

        assert!(!verdict.is_valid());
        let report = verdict.report().expect("report");
        assert_eq!(report.structure.stats.text_len, 597);
        assert_eq!(report.structure.score, 0.0);
        assert_eq!(
            report.structure.diagnose.get("content_check").map(String::as_str),
            Some("document appears to be empty tables or sparse text")
        );
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn metadata_without_title_or_topic_is_invalid() {
        let metadata = StubMetadata::new(json!({ "title": "", "language": "en" }));
        let matcher = topics(true);
        let engine = engine(metadata, Some(matcher.clone()));

        let verdict = engine.assess_extraction(deliverable(20), b"", "d.pdf").await;

        assert!(!verdict.is_valid());
        let report = verdict.report().expect("report");
        assert!(report.structure.diagnose.contains_key("metadata"));
        assert!(report.topic.is_none());
        assert_eq!(matcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn topic_alone_satisfies_metadata_check() {
        let metadata = StubMetadata::new(json!({ "topic": "Agroforestry" }));
        let engine = engine(metadata, Some(topics(false)));

        let verdict = engine.assess_extraction(deliverable(20), b"", "d.pdf").await;

        let report = verdict.report().expect("report");
        assert!(!report.structure.diagnose.contains_key("metadata"));
        assert!(!verdict.is_valid());
        assert_eq!(
            report.topic.as_ref().expect("topic").topics,
            vec![TopicCandidate::outliers()]
        );
    }

    #[tokio::test]
    async fn missing_topic_model_is_reported() {
        let metadata = StubMetadata::new(json!({ "title": "Soil Health Practices" }));
        let engine = engine(metadata, None);
        assert!(!engine.has_topic_model());

        let verdict = engine.assess_extraction(deliverable(20), b"", "d.pdf").await;

        assert!(!verdict.is_valid());
        let topic = verdict.report().and_then(|report| report.topic.clone()).expect("topic");
        assert_eq!(topic.diagnose.as_deref(), Some("topic model unavailable"));
    }

    #[tokio::test]
    async fn unreadable_input_degrades_to_invalid_verdict() {
        let metadata = StubMetadata::new(json!({ "title": "x" }));
        let engine = engine(metadata.clone(), None);

        let verdict = engine.validate(b"not a pdf at all", DocType::Pdf).await;

        assert!(!verdict.is_valid());
        let report = verdict.report().expect("report");
        assert_eq!(report.structure.stats.document.read_error, Some(ReadIssue::BadSignature));
        assert_eq!(report.structure.stats.document.bytes, 0);
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_type_short_circuits() {
        let metadata = StubMetadata::new(json!({}));
        let engine = engine(metadata.clone(), None);

        let verdict = engine.validate(b"PK\x03\x04", DocType::PowerPoint).await;

        assert_eq!(
            verdict,
            QualityVerdict::Unsupported {
                valid: false,
                diagnose: "unsupported file type: ppt".into(),
            }
        );
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn has_value_follows_truthiness() {
        let Value::Object(metadata) = json!({
            "a": null, "b": "", "c": [], "d": "x", "e": ["x"], "f": 0, "g": 1
        }) else {
            unreachable!()
        };
        for key in ["a", "b", "c", "f", "missing"] {
            assert!(!has_value(&metadata, key), "{key}");
        }
        for key in ["d", "e", "g"] {
            assert!(has_value(&metadata, key), "{key}");
        }
    }
}
