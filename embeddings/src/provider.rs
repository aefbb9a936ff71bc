//! Embedding providers.
//!
//! A provider performs exactly one remote call per text and reports every
//! failure as an [`EmbeddingError`]; it never substitutes a placeholder
//! vector. Text normalization and batching live in [`crate::Embedder`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Embedding;
use crate::config::ProviderConfig;
use crate::error::{EmbeddingError, Result};

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the model this provider embeds with.
    fn model(&self) -> &str;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// OpenAI-compatible embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL, without a trailing slash.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    model: String,
}

impl OpenAIProvider {
    /// Create a provider from explicit configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.endpoint_url.trim_end_matches('/').to_string(),
            client,
            model: config.model_name.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        let model = request.model.unwrap_or_else(|| self.model.clone());

        let body = serde_json::json!({
            "input": request.text,
            "model": model
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        let raw = response.text().await?;
        let result: OpenAIEmbeddingResponse = serde_json::from_str(&raw)
            .map_err(|e| EmbeddingError::InvalidResponse(format!("malformed body: {e}")))?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))?
            .embedding;

        if embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding vector".to_string(),
            ));
        }

        let dimension = embedding.len();
        debug!("Generated embedding with {dimension} dimensions using {model}");

        Ok(EmbeddingResponse {
            embedding,
            model: result.model.unwrap_or(model),
            dimension,
            tokens_used: result.usage.map(|u| u.total_tokens),
        })
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: Option<String>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}

/// Provider backed by a fixed table of vectors.
///
/// Useful for offline runs and tests. Every submitted text is recorded, and
/// a text missing from the table is an error rather than a zero vector.
pub struct StaticProvider {
    vectors: HashMap<String, Embedding>,
    model: String,
    calls: Mutex<Vec<String>>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            model: "static".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Map `text` to `embedding`.
    pub fn with_vector(mut self, text: impl Into<String>, embedding: Embedding) -> Self {
        self.vectors.insert(text.into(), embedding);
        self
    }

    /// Set the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Texts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of texts received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for StaticProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for StaticProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.text.clone());

        let embedding = self.vectors.get(&request.text).cloned().ok_or_else(|| {
            EmbeddingError::InvalidResponse(format!("no vector for input {:?}", request.text))
        })?;

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.model.clone(),
            tokens_used: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
