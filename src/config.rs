use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the document quality service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URL of the remote metadata extraction endpoint.
    pub metadata_endpoint: String,
    /// Optional bearer token sent to the metadata endpoint.
    pub metadata_api_key: Option<String>,
    /// Path of the prompt forwarded to the metadata extractor.
    pub metadata_prompt_path: PathBuf,
    /// Request timeout applied to metadata extraction calls, in seconds.
    pub metadata_timeout_secs: u64,
    /// Location of the exported topic model artifact.
    pub topic_model_path: PathBuf,
    /// Minimum similarity a topic must reach to count as a match.
    pub min_topic_prob: f64,
    /// Number of ranked topics requested from the model.
    pub topic_top_k: usize,
    /// Embedding provider used to vectorize metadata for topic matching.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier; must match the one used during topic training.
    pub embedding_model: String,
    /// Vector size produced by the hashing provider.
    pub embedding_dimension: usize,
    /// Optional base URL of the Ollama runtime.
    pub ollama_url: Option<String>,
    /// HTTP server port.
    pub server_port: u16,
    /// Root path under which the API is mounted.
    pub api_root_path: String,
    /// Prefix of the quality routes below the root path.
    pub api_prefix: String,
    /// Default input directory for batch runs.
    pub pdf_dir: PathBuf,
    /// Default output directory for valid batch records.
    pub valid_meta_dir: PathBuf,
    /// Default output directory for invalid batch records.
    pub invalid_meta_dir: PathBuf,
    /// File receiving the non-blocking log stream.
    pub log_file: PathBuf,
}

/// Supported embedding backends for topic matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Deterministic in-process hashing embeddings (offline use and tests).
    Hashing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata_endpoint: String::new(),
            metadata_api_key: None,
            metadata_prompt_path: PathBuf::from("config/prompt.txt"),
            metadata_timeout_secs: 60,
            topic_model_path: PathBuf::from("data/topic/model.json"),
            min_topic_prob: 0.5,
            topic_top_k: 3,
            embedding_provider: EmbeddingProvider::Ollama,
            embedding_model: "paraphrase-multilingual".to_string(),
            embedding_dimension: 768,
            ollama_url: None,
            server_port: 30600,
            api_root_path: "/project".to_string(),
            api_prefix: "/v1/doc-quality".to_string(),
            pdf_dir: PathBuf::from("data/pdf"),
            valid_meta_dir: PathBuf::from("data/metadata/valid_meta"),
            invalid_meta_dir: PathBuf::from("data/metadata/invalid_meta"),
            log_file: PathBuf::from("logs/docquality.log"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    ///
    /// Only `METADATA_ENDPOINT` is mandatory; every other setting falls back to [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            metadata_endpoint: load_env("METADATA_ENDPOINT")?,
            metadata_api_key: load_env_optional("METADATA_API_KEY"),
            metadata_prompt_path: load_env_optional("METADATA_PROMPT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.metadata_prompt_path),
            metadata_timeout_secs: parse_optional("METADATA_TIMEOUT_SECS")?
                .unwrap_or(defaults.metadata_timeout_secs),
            topic_model_path: load_env_optional("TOPIC_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.topic_model_path),
            min_topic_prob: parse_optional("MIN_TOPIC_PROB")?.unwrap_or(defaults.min_topic_prob),
            topic_top_k: parse_optional("TOPIC_TOP_K")?.unwrap_or(defaults.topic_top_k),
            embedding_provider: load_env_optional("EMBEDDING_PROVIDER")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(defaults.embedding_provider),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            embedding_dimension: parse_optional("EMBEDDING_DIMENSION")?
                .unwrap_or(defaults.embedding_dimension),
            ollama_url: load_env_optional("OLLAMA_URL"),
            server_port: parse_optional("SERVER_PORT")?.unwrap_or(defaults.server_port),
            api_root_path: load_env_optional("API_ROOT_PATH").unwrap_or(defaults.api_root_path),
            api_prefix: load_env_optional("API_PREFIX").unwrap_or(defaults.api_prefix),
            pdf_dir: load_env_optional("PDF_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.pdf_dir),
            valid_meta_dir: load_env_optional("VALID_META_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.valid_meta_dir),
            invalid_meta_dir: load_env_optional("INVALID_META_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.invalid_meta_dir),
            log_file: load_env_optional("DOCQUALITY_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" => Ok(Self::Hashing),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        metadata_endpoint = %config.metadata_endpoint,
        topic_model = %config.topic_model_path.display(),
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        min_topic_prob = config.min_topic_prob,
        server_port = config.server_port,
        log_file = %config.log_file.display(),
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
