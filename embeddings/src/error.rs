//! Error types for the embeddings system.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider not configured.
    #[error("embedding provider not configured: missing API key")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// HTTP error (transport failure or timeout).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Identifier list and vector rows do not line up.
    #[error("row count mismatch: {ids} ids but {rows} vectors")]
    RowCountMismatch { ids: usize, rows: usize },

    /// The persisted cache exists but cannot be used.
    #[error("corrupt embedding cache at {}: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    /// Search over a matrix with no rows.
    #[error("cannot search an empty corpus")]
    EmptyCorpus,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbeddingError {
    /// Whether this error came from the remote embedding call.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotConfigured
                | Self::ApiRequest(_)
                | Self::InvalidResponse(_)
                | Self::RateLimited { .. }
                | Self::Http(_)
        )
    }
}
