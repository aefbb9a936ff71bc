//! Configuration for embedding providers.

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_ENDPOINT_URL: &str = "https://ai-for-finance-hack.up.railway.app/";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Default number of texts per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Settings handed to a provider at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API.
    pub endpoint_url: String,

    /// Bearer token. Never read from or written to configuration files.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Embedding model name.
    pub model_name: String,

    /// Texts embedded per batch.
    pub batch_size: usize,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: 60,
        }
    }
}
