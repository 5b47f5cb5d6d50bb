//! HTTP client for the remote metadata extraction service.
//!
//! The service receives the document as a multipart upload together with an extraction prompt
//! and answers with a flat JSON object. Failures never escape [`MetadataExtractor::extract`];
//! they are reported inside the returned mapping under `diagnostics.error`.

use super::Metadata;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the metadata extraction service.
#[derive(Debug, Error)]
pub enum MetadataClientError {
    /// HTTP layer failed before a usable response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("Unexpected metadata service response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The response body was not valid JSON.
    #[error("Malformed metadata response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The response was JSON but not an object.
    #[error("metadata response is not a JSON object")]
    NotAnObject,
}

impl MetadataClientError {
    /// Reason recorded in the diagnostics entry for this failure.
    fn diagnostic(&self) -> String {
        match self {
            Self::Http(_) | Self::UnexpectedStatus { .. } => "endpoint connection failed".into(),
            Self::InvalidJson(_) => "invalid json response".into(),
            Self::NotAnObject => format!("unknown metadata extraction error ({self})"),
        }
    }
}

/// Interface implemented by metadata extraction backends.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extract descriptive metadata from a document.
    ///
    /// On failure the mapping contains only `{"diagnostics": {"error": ...}}`.
    async fn extract(&self, bytes: &[u8], file_name: &str) -> Metadata;
}

/// Metadata extractor backed by the remote HTTP service.
pub struct HttpMetadataClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    prompt: String,
}

impl HttpMetadataClient {
    /// Build a client from configuration, reading the extraction prompt once.
    pub fn new(config: &Config) -> Result<Self, MetadataClientError> {
        let http = Client::builder()
            .user_agent("docquality/0.1")
            .timeout(Duration::from_secs(config.metadata_timeout_secs))
            .build()?;

        let prompt = match std::fs::read_to_string(&config.metadata_prompt_path) {
            Ok(prompt) => prompt,
            Err(error) => {
                tracing::warn!(
                    path = %config.metadata_prompt_path.display(),
                    %error,
                    "Metadata prompt unavailable; sending an empty prompt"
                );
                String::new()
            }
        };

        tracing::debug!(
            endpoint = %config.metadata_endpoint,
            has_api_key = config
                .metadata_api_key
                .as_deref()
                .is_some_and(|key| !key.is_empty()),
            prompt_chars = prompt.len(),
            "Initialized metadata client"
        );

        Ok(Self {
            http,
            endpoint: config.metadata_endpoint.clone(),
            api_key: config.metadata_api_key.clone(),
            prompt,
        })
    }

    async fn request(&self, bytes: &[u8], file_name: &str) -> Result<Metadata, MetadataClientError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = Form::new()
            .part("file", part)
            .text("prompt", self.prompt.clone());

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataClientError::UnexpectedStatus { status, body });
        }

        let body = response.text().await?;
        match serde_json::from_str::<Value>(&body)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(MetadataClientError::NotAnObject),
        }
    }
}

#[async_trait]
impl MetadataExtractor for HttpMetadataClient {
    async fn extract(&self, bytes: &[u8], file_name: &str) -> Metadata {
        match self.request(bytes, file_name).await {
            Ok(metadata) => {
                tracing::debug!(fields = metadata.len(), "Metadata extracted");
                metadata
            }
            Err(error) => {
                tracing::warn!(%error, endpoint = %self.endpoint, "Metadata extraction failed");
                failure_metadata(error.diagnostic())
            }
        }
    }
}

/// Mapping reported when extraction failed.
pub fn failure_metadata(reason: String) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("diagnostics".into(), json!({ "error": reason }));
    metadata
}

fn mime_for(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}
