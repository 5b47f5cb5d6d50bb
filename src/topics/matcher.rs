//! Topic matcher applying the outlier and probability rules on top of the model ranking.

use super::model::{TopicModel, TopicModelError};
use crate::config::Config;
use crate::embedding::{EmbeddingClient, EmbeddingClientError, build_embedding_client};
use crate::metadata::Metadata;
use crate::quality::{OUTLIER_TOPIC_ID, TopicCandidate, TopicReport};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Metadata fields flattened into the text used for topic matching, in order.
const METADATA_TEXT_FIELDS: &[&str] = &["title", "subtitle", "description", "topic", "theme"];

/// Errors raised while matching a text against the topic model.
#[derive(Debug, Error)]
pub enum TopicMatchError {
    /// Embedding provider failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Topic model could not be loaded or queried.
    #[error(transparent)]
    Model(#[from] TopicModelError),
    /// Provider returned no vector for the query.
    #[error("embedding provider returned no vector")]
    MissingEmbedding,
}

/// Semantic validity plus the report shown to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMatch {
    /// At least one topic reached the minimum probability.
    pub is_valid: bool,
    /// Assigned topics, or the OUTLIERS entry.
    pub report: TopicReport,
}

impl TopicMatch {
    fn rejected(diagnose: Option<String>) -> Self {
        Self {
            is_valid: false,
            report: TopicReport::outliers(diagnose),
        }
    }
}

/// Interface implemented by topic matchers.
#[async_trait]
pub trait TopicMatcher: Send + Sync {
    /// Match free text against the topic model.
    async fn match_text(&self, text: &str, top_k: usize) -> TopicMatch;

    /// Match extracted metadata, flattened with [`metadata_text`].
    async fn match_metadata(&self, metadata: &Metadata, top_k: usize) -> TopicMatch {
        self.match_text(&metadata_text(metadata), top_k).await
    }
}

/// Flatten the descriptive metadata fields into one space-separated text.
///
/// `keywords` may be a list or a string; empty parts are skipped.
pub fn metadata_text(metadata: &Metadata) -> String {
    let mut parts: Vec<String> = METADATA_TEXT_FIELDS
        .iter()
        .filter_map(|field| metadata.get(*field))
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    let keywords = match metadata.get("keywords") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        Some(Value::String(keywords)) => keywords.clone(),
        _ => String::new(),
    };
    parts.push(keywords);

    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Keep ranked candidates reaching `min_prob`, stopping at a confident outlier.
///
/// A sentinel candidate at or above `min_prob` ends the scan; below it, the sentinel is ignored.
pub fn select_topics<'a>(
    ranked: &[(i64, f64)],
    min_prob: f64,
    name_of: impl Fn(i64) -> Option<&'a str>,
) -> Vec<TopicCandidate> {
    let mut selected = Vec::new();
    for &(topic_id, score) in ranked {
        if topic_id == OUTLIER_TOPIC_ID {
            if score >= min_prob {
                break;
            }
            continue;
        }
        if score < min_prob {
            continue;
        }
        if let Some(name) = name_of(topic_id) {
            selected.push(TopicCandidate {
                topic_id,
                topic_name: name.to_string(),
                probability: Some(score),
            });
        }
    }
    selected
}

/// Topic matcher embedding the query and ranking it against an exported [`TopicModel`].
pub struct EmbeddingTopicMatcher {
    model: TopicModel,
    embedder: Box<dyn EmbeddingClient>,
    min_prob: f64,
}

impl EmbeddingTopicMatcher {
    /// Combine a loaded model with an embedding client.
    pub fn new(model: TopicModel, embedder: Box<dyn EmbeddingClient>, min_prob: f64) -> Self {
        Self {
            model,
            embedder,
            min_prob,
        }
    }

    /// Load the model artifact and embedding client named by configuration.
    pub fn from_config(config: &Config) -> Result<Self, TopicMatchError> {
        let model = TopicModel::load(&config.topic_model_path)?;
        if model.embedding_model() != config.embedding_model {
            tracing::warn!(
                trained_with = %model.embedding_model(),
                configured = %config.embedding_model,
                "Topic model was trained with a different embedding model"
            );
        }
        let embedder = build_embedding_client(config)?;
        Ok(Self::new(model, embedder, config.min_topic_prob))
    }

    async fn rank(&self, text: &str, top_k: usize) -> Result<Vec<(i64, f64)>, TopicMatchError> {
        let embedding = self
            .embedder
            .generate_embeddings(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(TopicMatchError::MissingEmbedding)?;
        Ok(self.model.find_topics(&embedding, top_k)?)
    }
}

#[async_trait]
impl TopicMatcher for EmbeddingTopicMatcher {
    async fn match_text(&self, text: &str, top_k: usize) -> TopicMatch {
        if text.trim().is_empty() {
            return TopicMatch::rejected(Some("no valid text for topic assignment".to_string()));
        }

        let ranked = match self.rank(text, top_k).await {
            Ok(ranked) => ranked,
            Err(error) => {
                tracing::warn!(%error, "Topic matching failed");
                return TopicMatch::rejected(Some(error.to_string()));
            }
        };

        let topics = select_topics(&ranked, self.min_prob, |id| self.model.topic_name(id));
        tracing::debug!(
            candidates = ranked.len(),
            assigned = topics.len(),
            min_prob = self.min_prob,
            "Topics matched"
        );

        if topics.is_empty() {
            return TopicMatch::rejected(None);
        }
        TopicMatch {
            is_valid: true,
            report: TopicReport {
                topics,
                diagnose: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn generate_embeddings(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingClient for FailingEmbedder {
        async fn generate_embeddings(
            &self,
            _texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
            Err(EmbeddingClientError::ProviderUnavailable("offline".into()))
        }
    }

    fn model() -> TopicModel {
        TopicModel::from_json(
            r#"{"embedding_model":"m","topics":[
                {"topic_id":-1,"name":"-1_misc","embedding":[0.0,0.0,1.0]},
                {"topic_id":0,"name":"0_soil","custom_name":"Soil carbon","embedding":[1.0,0.0,0.0]},
                {"topic_id":1,"name":"1_water","custom_name":"Water retention","embedding":[0.0,1.0,0.0]}
            ]}"#,
        )
        .expect("model")
    }

    fn matcher(query: Vec<f32>) -> EmbeddingTopicMatcher {
        EmbeddingTopicMatcher::new(model(), Box::new(FixedEmbedder(query)), 0.5)
    }

    fn name(id: i64) -> Option<&'static str> {
        Some(match id {
            0 => "Soil carbon",
            1 => "Water retention",
            _ => "other",
        })
    }

    #[test]
    fn confident_outlier_stops_selection() {
        let ranked = [(0, 0.9), (-1, 0.7), (1, 0.6)];
        let topics = select_topics(&ranked, 0.5, name);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].topic_id, 0);
    }

    #[test]
    fn weak_outlier_is_skipped() {
        let ranked = [(-1, 0.3), (0, 0.9), (1, 0.6)];
        let ids: Vec<i64> = select_topics(&ranked, 0.5, name)
            .iter()
            .map(|topic| topic.topic_id)
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn candidates_below_threshold_are_dropped() {
        let ranked = [(0, 0.49), (1, 0.2)];
        assert!(select_topics(&ranked, 0.5, name).is_empty());
    }

    #[test]
    fn metadata_text_joins_known_fields() {
        let metadata = json!({
            "title": "Soil health",
            "subtitle": "",
            "description": "Cover crops in vineyards",
            "keywords": ["soil", "carbon"],
            "language": "en"
        });
        let Value::Object(metadata) = metadata else {
            unreachable!()
        };
        assert_eq!(
            metadata_text(&metadata),
            "Soil health Cover crops in vineyards soil carbon"
        );
        assert_eq!(metadata_text(&Metadata::new()), "");
    }

    #[tokio::test]
    async fn empty_text_is_rejected_with_diagnose() {
        let result = matcher(vec![1.0, 0.0, 0.0]).match_text("   ", 3).await;
        assert!(!result.is_valid);
        assert_eq!(
            result.report.diagnose.as_deref(),
            Some("no valid text for topic assignment")
        );
        assert_eq!(result.report.topics, vec![TopicCandidate::outliers()]);
    }

    #[tokio::test]
    async fn matching_topic_is_named_by_custom_name() {
        let result = matcher(vec![0.95, 0.3, 0.0]).match_text("soil", 3).await;
        assert!(result.is_valid);
        assert_eq!(result.report.topics[0].topic_name, "Soil carbon");
        assert!(result.report.topics[0].probability.expect("probability") >= 0.5);
    }

    #[tokio::test]
    async fn confident_outlier_yields_outliers_entry() {
        let result = matcher(vec![0.0, 0.0, 1.0]).match_text("misc", 3).await;
        assert!(!result.is_valid);
        assert_eq!(result.report.topics, vec![TopicCandidate::outliers()]);
        assert_eq!(result.report.diagnose, None);
    }

    #[tokio::test]
    async fn embedding_failure_becomes_diagnose() {
        let matcher = EmbeddingTopicMatcher::new(model(), Box::new(FailingEmbedder), 0.5);
        let result = matcher.match_text("soil", 3).await;
        assert!(!result.is_valid);
        assert!(
            result
                .report
                .diagnose
                .as_deref()
                .is_some_and(|reason| reason.contains("offline"))
        );
    }

    #[tokio::test]
    async fn metadata_without_text_is_rejected() {
        let result = matcher(vec![1.0, 0.0, 0.0])
            .match_metadata(&Metadata::new(), 3)
            .await;
        assert!(!result.is_valid);
    }
}
