//! Topic model artifact loading and similarity ranking.
//!
//! The artifact is a JSON document exported by the offline trainer:
//!
//! ```json
//! {
//!   "embedding_model": "paraphrase-multilingual",
//!   "topics": [
//!     { "topic_id": -1, "name": "-1_outliers", "embedding": [0.1, 0.2] },
//!     { "topic_id": 4, "name": "4_soil_carbon", "custom_name": "Soil carbon", "embedding": [0.3, 0.1] }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or querying a topic model.
#[derive(Debug, Error)]
pub enum TopicModelError {
    /// Artifact file could not be read.
    #[error("failed to read topic model {path}: {source}")]
    Io {
        /// Location of the artifact.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Artifact was not valid JSON or did not match the expected layout.
    #[error("malformed topic model: {0}")]
    Parse(#[from] serde_json::Error),
    /// Artifact contained no topics.
    #[error("topic model contains no topics")]
    Empty,
    /// Embeddings do not share one dimension.
    #[error("topic {topic_id} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Offending topic.
        topic_id: i64,
        /// Dimension of the model.
        expected: usize,
        /// Dimension encountered.
        found: usize,
    },
    /// Query vector does not match the model dimension.
    #[error("query has dimension {found}, model expects {expected}")]
    QueryDimension {
        /// Dimension of the model.
        expected: usize,
        /// Dimension of the query.
        found: usize,
    },
}

#[derive(Debug, Deserialize)]
struct TopicModelArtifact {
    embedding_model: String,
    topics: Vec<TopicEntry>,
}

/// One topic of the model.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicEntry {
    /// Topic identifier; `-1` is the outlier topic.
    pub topic_id: i64,
    /// Generated topic name.
    pub name: String,
    /// Curated label, preferred for display when present.
    #[serde(default)]
    pub custom_name: Option<String>,
    /// Topic centroid in embedding space.
    pub embedding: Vec<f32>,
}

impl TopicEntry {
    /// Name shown in reports.
    pub fn display_name(&self) -> &str {
        self.custom_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }
}

/// In-memory topic model.
#[derive(Debug, Clone)]
pub struct TopicModel {
    embedding_model: String,
    topics: Vec<TopicEntry>,
    dimension: usize,
}

impl TopicModel {
    /// Load the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, TopicModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TopicModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            topics = model.topics.len(),
            dimension = model.dimension,
            embedding_model = %model.embedding_model,
            "Loaded topic model"
        );
        Ok(model)
    }

    /// Parse an artifact from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self, TopicModelError> {
        let artifact: TopicModelArtifact = serde_json::from_str(raw)?;
        Self::new(artifact.embedding_model, artifact.topics)
    }

    /// Build a model from topics, checking that all embeddings share one dimension.
    pub fn new(embedding_model: String, topics: Vec<TopicEntry>) -> Result<Self, TopicModelError> {
        let dimension = topics.first().ok_or(TopicModelError::Empty)?.embedding.len();
        if let Some(topic) = topics.iter().find(|topic| topic.embedding.len() != dimension) {
            return Err(TopicModelError::DimensionMismatch {
                topic_id: topic.topic_id,
                expected: dimension,
                found: topic.embedding.len(),
            });
        }
        Ok(Self {
            embedding_model,
            topics,
            dimension,
        })
    }

    /// Embedding model the topics were trained with.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Shared embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Display name of a topic.
    pub fn topic_name(&self, topic_id: i64) -> Option<&str> {
        self.topics
            .iter()
            .find(|topic| topic.topic_id == topic_id)
            .map(TopicEntry::display_name)
    }

    /// Rank topics by cosine similarity to `query`, returning at most `top_n` `(id, score)` pairs
    /// in descending score order.
    pub fn find_topics(
        &self,
        query: &[f32],
        top_n: usize,
    ) -> Result<Vec<(i64, f64)>, TopicModelError> {
        if query.len() != self.dimension {
            return Err(TopicModelError::QueryDimension {
                expected: self.dimension,
                found: query.len(),
            });
        }

        let mut ranked: Vec<(i64, f64)> = self
            .topics
            .iter()
            .map(|topic| (topic.topic_id, cosine_similarity(query, &topic.embedding)))
            .collect();
        ranked.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

/// Cosine similarity of two vectors; `0.0` when lengths differ or either vector is zero.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let (dot, left_norm, right_norm) = left.iter().zip(right).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, left_norm, right_norm), (l, r)| {
            let (l, r) = (f64::from(*l), f64::from(*r));
            (dot + l * r, left_norm + l * l, right_norm + r * r)
        },
    );

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm.sqrt() * right_norm.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARTIFACT: &str = r#"{
        "embedding_model": "paraphrase-multilingual",
        "topics": [
            { "topic_id": -1, "name": "-1_misc", "embedding": [0.0, 0.0, 1.0] },
            { "topic_id": 0, "name": "0_soil_carbon", "custom_name": "Soil carbon", "embedding": [1.0, 0.0, 0.0] },
            { "topic_id": 1, "name": "1_water", "embedding": [0.0, 1.0, 0.0] }
        ]
    }"#;

    #[test]
    fn ranks_topics_by_similarity() {
        let model = TopicModel::from_json(ARTIFACT).expect("model");
        let ranked = model.find_topics(&[0.9, 0.1, 0.0], 2).expect("ranked");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 1);
        assert!(ranked[0].1 > ranked[1].1);
    }

    #[test]
    fn display_name_prefers_custom_name() {
        let model = TopicModel::from_json(ARTIFACT).expect("model");
        assert_eq!(model.topic_name(0), Some("Soil carbon"));
        assert_eq!(model.topic_name(1), Some("1_water"));
        assert_eq!(model.topic_name(42), None);
    }

    #[test]
    fn rejects_query_of_wrong_dimension() {
        let model = TopicModel::from_json(ARTIFACT).expect("model");
        assert!(matches!(
            model.find_topics(&[1.0, 0.0], 3),
            Err(TopicModelError::QueryDimension { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn rejects_inconsistent_or_empty_artifacts() {
        let mixed = r#"{"embedding_model":"m","topics":[
            {"topic_id":0,"name":"a","embedding":[1.0,0.0]},
            {"topic_id":1,"name":"b","embedding":[1.0]}]}"#;
        assert!(matches!(
            TopicModel::from_json(mixed),
            Err(TopicModelError::DimensionMismatch { topic_id: 1, .. })
        ));
        assert!(matches!(
            TopicModel::from_json(r#"{"embedding_model":"m","topics":[]}"#),
            Err(TopicModelError::Empty)
        ));
        assert!(matches!(TopicModel::from_json("nope"), Err(TopicModelError::Parse(_))));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(ARTIFACT.as_bytes()).expect("write");
        let model = TopicModel::load(file.path()).expect("model");
        assert_eq!(model.dimension(), 3);
        assert_eq!(model.embedding_model(), "paraphrase-multilingual");

        let missing = TopicModel::load(Path::new("does/not/exist.json"));
        assert!(matches!(missing, Err(TopicModelError::Io { .. })));
    }

    #[test]
    fn cosine_similarity_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
    }
}
