//! # Retrieval
//!
//! This crate ties the embeddings core to the knowledge base and the
//! question set:
//!
//! - **Corpus**: articles loaded from CSV, with stable unique ids
//! - **Engine**: cache-backed corpus embeddings and per-question search
//! - **Answer**: grounded answer generation through a chat model
//! - **Pipeline**: the question loop, bounded-concurrent and order-preserving
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Retrieval Pipeline                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │    Corpus    │  │  Embedding   │  │  Questions   │          │
//! │  │    (CSV)     │  │    Cache     │  │    (CSV)     │          │
//! │  └──────────────┘  └──────────────┘  └──────────────┘          │
//! │         │                │                  │                   │
//! │         └────────┬───────┘                  │                   │
//! │                  ▼                          │                   │
//! │          ┌──────────────┐                   │                   │
//! │          │  Retriever   │◄──────────────────┘                   │
//! │          └──────────────┘                                       │
//! │                  │                                              │
//! │                  ▼                                              │
//! │          ┌──────────────┐                                       │
//! │          │   Answer     │                                       │
//! │          │  Generator   │                                       │
//! │          └──────────────┘                                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finrag_retrieval::{CachedFullRebuild, Corpus, Retriever};
//!
//! let corpus = Corpus::from_csv("train_data.csv")?;
//! let builder = CachedFullRebuild::new(cache, embedder.clone(), EmbedField::Annotation);
//! let retriever = Retriever::build(corpus, embedder, &builder, &NoProgress).await?;
//!
//! let best = retriever.retrieve("Как открыть вклад?").await?;
//! ```

pub mod answer;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod questions;

pub use answer::{AnswerGenerator, ChatCompletionsGenerator, build_prompt};
pub use config::{DataConfig, GenerationConfig, RetrievalConfig};
pub use corpus::{Article, Corpus, EmbedField};
pub use engine::{
    CachedFullRebuild, IndexBuilder, RetrievedArticle, Retriever, load_or_create_embeddings,
};
pub use error::{CorpusError, Result, RetrievalError};
pub use pipeline::{AnsweredQuestion, answer_question, answer_questions};
pub use questions::QuestionSet;

// Re-export from dependencies for convenience
pub use finrag_embeddings::{
    Embedder, EmbeddingCache, EmbeddingProvider, NoProgress, OpenAIProvider, ProgressSink,
};
