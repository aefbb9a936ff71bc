//! # Embeddings
//!
//! This crate provides the retrieval core of finrag: turning text into
//! dense vectors, persisting those vectors between runs, and finding the
//! closest corpus row for a query.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors through a remote model
//! - **Caching**: A single persisted snapshot of corpus vectors, keyed by item ids
//! - **Similarity Search**: Exact cosine search over the whole corpus matrix
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedder ──► EmbeddingMatrix            │
//! │       │                   │              │                      │
//! │       ▼                   ▼              ▼                      │
//! │  OpenAI/Static      ProgressSink   EmbeddingCache / VectorIndex │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod embedder;
pub mod error;
pub mod index;
pub mod matrix;
pub mod progress;
pub mod provider;
pub mod similarity;

pub use cache::{CachedEmbeddings, EmbeddingCache, is_valid};
pub use config::ProviderConfig;
pub use embedder::{EMPTY_TEXT_PLACEHOLDER, Embedder, prepare_input};
pub use error::{EmbeddingError, Result};
pub use index::{BruteForceIndex, IndexHit, VectorIndex};
pub use matrix::EmbeddingMatrix;
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider, StaticProvider,
};
pub use similarity::{BestMatch, cosine_similarity, find_best_match, find_top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
