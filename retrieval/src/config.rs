//! Configuration for the retrieval pipeline.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! a `.env` file and the process environment. Credentials are only ever
//! taken from the environment layer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use finrag_embeddings::ProviderConfig;
use finrag_embeddings::config::DEFAULT_ENDPOINT_URL;

use crate::corpus::EmbedField;
use crate::error::{Result, RetrievalError};
use crate::questions::{DEFAULT_ANSWER_COLUMN, DEFAULT_QUESTION_COLUMN};

/// Environment variable holding the embedding API key.
pub const EMBEDDER_API_KEY_VAR: &str = "EMBEDDER_API_KEY";

/// Environment variable holding the generation API key.
pub const LLM_API_KEY_VAR: &str = "LLM_API_KEY";

/// Default chat model used for answers.
pub const DEFAULT_LLM_MODEL: &str = "openrouter/mistralai/mistral-small-3.2-24b-instruct";

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Article field embedded for retrieval.
    pub embed_field: EmbedField,

    /// Questions processed at the same time.
    pub concurrency: usize,

    /// Embedding provider configuration.
    pub embedding: ProviderConfig,

    /// Answer generation configuration.
    pub generation: GenerationConfig,

    /// Input and output locations.
    pub data: DataConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embed_field: EmbedField::Annotation,
            concurrency: 1,
            embedding: ProviderConfig::default(),
            generation: GenerationConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RetrievalError::Config(e.to_string()))
    }

    /// Read a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load defaults or `path`, then `.env` and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };

        match dotenvy::dotenv() {
            Ok(env_path) => debug!("Loaded environment from {}", env_path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(RetrievalError::Config(format!(".env: {e}"))),
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment-style lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(EMBEDDER_API_KEY_VAR) {
            self.embedding.api_key = Some(key);
        }
        if let Some(key) = non_empty(LLM_API_KEY_VAR) {
            self.generation.api_key = Some(key);
        }
        if let Some(url) = non_empty("FINRAG_EMBEDDING_URL") {
            self.embedding.endpoint_url = url;
        }
        if let Some(url) = non_empty("FINRAG_LLM_URL") {
            self.generation.endpoint_url = url;
        }
        if let Some(model) = non_empty("FINRAG_EMBEDDING_MODEL") {
            self.embedding.model_name = model;
        }
        if let Some(model) = non_empty("FINRAG_LLM_MODEL") {
            self.generation.model_name = model;
        }
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.batch_size == 0 {
            return Err(RetrievalError::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(RetrievalError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fail unless an embedding API key is present.
    pub fn require_embedding_key(&self) -> Result<()> {
        if self.embedding.api_key.is_none() {
            return Err(RetrievalError::Config(format!(
                "{EMBEDDER_API_KEY_VAR} is not set (add it to .env or the environment)"
            )));
        }
        Ok(())
    }

    /// Fail unless a generation API key is present.
    pub fn require_generation_key(&self) -> Result<()> {
        if self.generation.api_key.is_none() {
            return Err(RetrievalError::Config(format!(
                "{LLM_API_KEY_VAR} is not set (add it to .env or the environment)"
            )));
        }
        Ok(())
    }
}

/// Configuration for the chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API.
    pub endpoint_url: String,

    /// Bearer token, taken from the environment only.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Chat model name.
    pub model_name: String,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            api_key: None,
            model_name: DEFAULT_LLM_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// File locations and CSV column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Article CSV.
    pub articles_path: PathBuf,

    /// Question CSV.
    pub questions_path: PathBuf,

    /// Answered question CSV.
    pub output_path: PathBuf,

    /// Embedding cache file.
    pub cache_path: PathBuf,

    /// Header of the question column.
    pub question_column: String,

    /// Header of the answer column added to the output.
    pub answer_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            articles_path: PathBuf::from("train_data.csv"),
            questions_path: PathBuf::from("questions.csv"),
            output_path: PathBuf::from("submission.csv"),
            cache_path: PathBuf::from("embeddings.json"),
            question_column: DEFAULT_QUESTION_COLUMN.to_string(),
            answer_column: DEFAULT_ANSWER_COLUMN.to_string(),
        }
    }
}
