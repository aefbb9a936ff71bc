//! Text normalization and batched embedding on top of a provider.

use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info};

use crate::Embedding;
use crate::config::ProviderConfig;
use crate::error::{EmbeddingError, Result};
use crate::matrix::EmbeddingMatrix;
use crate::progress::ProgressSink;
use crate::provider::{EmbeddingProvider, EmbeddingRequest};

/// Text submitted in place of empty or missing input.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "Empty text";

/// Normalize text before it is sent to a provider.
///
/// Newlines become spaces and surrounding whitespace is trimmed. Missing,
/// empty and whitespace-only input all collapse to
/// [`EMPTY_TEXT_PLACEHOLDER`], so the provider never sees an empty string.
pub fn prepare_input(text: Option<&str>) -> String {
    let single_line = text.unwrap_or_default().replace(['\r', '\n'], " ");
    let trimmed = single_line.trim();
    if trimmed.is_empty() {
        EMPTY_TEXT_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Embeds single texts and batches through an [`EmbeddingProvider`].
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    /// Create an embedder. A `batch_size` of zero is treated as one.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Create an embedder using the batch size from `config`.
    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &ProviderConfig) -> Self {
        Self::new(provider, config.batch_size)
    }

    /// Model name reported by the provider.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Texts per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed one text.
    pub async fn embed(&self, text: Option<&str>) -> Result<Embedding> {
        let input = prepare_input(text);
        let response = self.provider.embed(EmbeddingRequest::new(input)).await?;
        Ok(response.embedding)
    }

    /// Lazily embed `texts` one batch at a time.
    ///
    /// Each item holds the vectors of one batch, in input order. Calls inside
    /// a batch are sequential. The stream is finite; to start over, call this
    /// again.
    pub fn stream_batches<'a>(
        &'a self,
        texts: &'a [String],
    ) -> impl Stream<Item = Result<Vec<Embedding>>> + 'a {
        futures::stream::iter(texts.chunks(self.batch_size)).then(move |chunk| async move {
            let mut vectors = Vec::with_capacity(chunk.len());
            for text in chunk {
                vectors.push(self.embed(Some(text.as_str())).await?);
            }
            debug!("Embedded batch of {}", vectors.len());
            Ok::<_, EmbeddingError>(vectors)
        })
    }

    /// Embed all `texts`; row `i` of the result belongs to `texts[i]`.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        progress: &dyn ProgressSink,
    ) -> Result<EmbeddingMatrix> {
        info!(
            "Creating embeddings for {} texts in batches of {}",
            texts.len(),
            self.batch_size
        );
        progress.start("Creating embeddings", texts.len());

        let mut rows = Vec::with_capacity(texts.len());
        let mut batches = pin!(self.stream_batches(texts));
        while let Some(batch) = batches.next().await {
            let batch = batch?;
            progress.advance(batch.len());
            rows.extend(batch);
        }
        progress.finish();

        EmbeddingMatrix::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{LogProgress, NoProgress};
    use crate::provider::StaticProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prepare_input() {
        assert_eq!(prepare_input(Some("a\nb")), "a b");
        assert_eq!(prepare_input(Some("  padded \n")), "padded");
        assert_eq!(prepare_input(Some("")), EMPTY_TEXT_PLACEHOLDER);
        assert_eq!(prepare_input(Some(" \n\t ")), EMPTY_TEXT_PLACEHOLDER);
        assert_eq!(prepare_input(None), EMPTY_TEXT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_empty_and_missing_share_placeholder() {
        let provider = Arc::new(
            StaticProvider::new().with_vector(EMPTY_TEXT_PLACEHOLDER, vec![0.5, 0.5]),
        );
        let embedder = Embedder::new(provider.clone(), 10);

        let from_empty = embedder.embed(Some("")).await.unwrap();
        let from_none = embedder.embed(None).await.unwrap();

        assert_eq!(from_empty, from_none);
        assert_eq!(
            provider.calls(),
            vec![EMPTY_TEXT_PLACEHOLDER, EMPTY_TEXT_PLACEHOLDER]
        );
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = Arc::new(
            StaticProvider::new()
                .with_vector("t1", vec![1.0, 0.0])
                .with_vector("t2", vec![0.0, 1.0])
                .with_vector("t3", vec![1.0, 1.0]),
        );
        let embedder = Embedder::new(provider.clone(), 2);
        let texts = vec!["t1".to_string(), "t2".to_string(), "t3".to_string()];

        let progress = LogProgress::new();
        let matrix = embedder.embed_batch(&texts, &progress).await.unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(progress.done(), 3);
        for (i, text) in texts.iter().enumerate() {
            let single = embedder.embed(Some(text.as_str())).await.unwrap();
            assert_eq!(matrix.row(i), Some(single.as_slice()));
        }
    }

    #[tokio::test]
    async fn test_stream_yields_one_item_per_chunk() {
        let provider = Arc::new(StaticProvider::new().with_vector("x", vec![1.0]));
        let embedder = Embedder::new(provider, 2);
        let texts = vec!["x".to_string(); 5];

        let sizes: Vec<usize> = embedder
            .stream_batches(&texts)
            .map(|batch| batch.unwrap().len())
            .collect()
            .await;

        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_batch_failure_propagates() {
        let provider = Arc::new(StaticProvider::new().with_vector("ok", vec![1.0]));
        let embedder = Embedder::new(provider.clone(), 10);
        let texts = vec!["ok".to_string(), "missing".to_string(), "ok".to_string()];

        let err = embedder.embed_batch(&texts, &NoProgress).await.unwrap_err();

        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
        // Nothing after the failing text is attempted.
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let embedder = Embedder::new(Arc::new(StaticProvider::new()), 0);
        assert_eq!(embedder.batch_size(), 1);
    }
}
