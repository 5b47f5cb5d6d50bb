//! Document quality assessment: typology, headers, structural scoring and the orchestrator.

pub mod assessment;
pub mod diagnose;
pub mod engine;
pub mod headers;
pub mod rules;
pub mod types;
pub mod typology;

pub use assessment::{EngineError, QualityAssessment};
pub use diagnose::{Diagnosis, diagnose};
pub use engine::EngineHolder;
pub use headers::{HeaderExtraction, extract_headers};
pub use types::{
    Diagnostics, Headers, OUTLIER_TOPIC_ID, QualityReport, QualityVerdict, StructureReport,
    StructureStats, TopicCandidate, TopicReport, Typology,
};
pub use typology::classify;
