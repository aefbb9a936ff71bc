//! Error types for the retrieval pipeline.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval pipeline.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding, cache or search error.
    #[error("embedding error: {0}")]
    Embedding(#[from] finrag_embeddings::EmbeddingError),

    /// Corpus or question data is unusable.
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    /// CSV read or write failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Answer generation failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// HTTP error from the generation API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Data validation errors for articles and questions.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Two articles share an identifier.
    #[error("duplicate article id: {0}")]
    DuplicateId(String),

    /// An article has no identifier.
    #[error("article at row {row} has an empty id")]
    EmptyId { row: usize },

    /// A required CSV column is absent.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Answers do not line up with questions.
    #[error("expected {expected} answers, got {actual}")]
    AnswerCount { expected: usize, actual: usize },
}
