//! Semantic topic matching against an offline-exported topic model.

pub mod matcher;
pub mod model;

pub use matcher::{EmbeddingTopicMatcher, TopicMatch, TopicMatchError, TopicMatcher, metadata_text};
pub use model::{TopicModel, TopicModelError, cosine_similarity};
