//! Retrieval engine: cached corpus embeddings plus per-question search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use finrag_embeddings::{
    BruteForceIndex, CachedEmbeddings, EmbeddingCache, EmbeddingError, EmbeddingMatrix, Embedder,
    IndexHit, ProgressSink, VectorIndex,
};

use crate::corpus::{Article, Corpus, EmbedField};
use crate::error::Result;

/// The article chosen for a question, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedArticle {
    /// Article identifier.
    pub id: String,

    /// Full article text.
    pub text: String,

    /// Article annotation.
    pub annotation: String,

    /// Article tags.
    pub tags: String,

    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

impl RetrievedArticle {
    /// Pair an article with its score. Floating-point overshoot past the
    /// cosine range is clamped away.
    pub fn new(article: &Article, score: f32) -> Self {
        Self {
            id: article.id.clone(),
            text: article.text.clone(),
            annotation: article.annotation.clone(),
            tags: article.tags.clone(),
            score: score.clamp(-1.0, 1.0),
        }
    }
}

/// Load corpus vectors from `cache`, or compute and persist them.
///
/// The cache is reused only when its identifiers equal the corpus ids in the
/// same order and it was produced by the embedder's model from the same
/// article `field`. Otherwise every article is embedded again; there is no
/// partial update. A cache that cannot
/// be read or written is logged and otherwise ignored.
pub async fn load_or_create_embeddings(
    corpus: &Corpus,
    cache: &EmbeddingCache,
    embedder: &Embedder,
    field: EmbedField,
    progress: &dyn ProgressSink,
) -> Result<EmbeddingMatrix> {
    let current_ids = corpus.ids();

    match cache.load().await {
        Ok(Some(record))
            if record.is_valid_for(&current_ids)
                && record.model == embedder.model()
                && record.source == field.as_str() =>
        {
            info!("Using cached embeddings for {} articles", current_ids.len());
            return Ok(record.vectors);
        }
        Ok(Some(record)) => {
            info!(
                "Embedding cache is stale ({} cached ids, model {}, field {}), rebuilding",
                record.ids.len(),
                record.model,
                record.source
            );
        }
        Ok(None) => info!("No embedding cache found, building one"),
        Err(e) => warn!("Ignoring unusable embedding cache: {e}"),
    }

    debug!("Embedding article field {field:?}");
    let texts = corpus.embedding_texts(field);
    let vectors = embedder.embed_batch(&texts, progress).await?;
    let record =
        CachedEmbeddings::new(current_ids, vectors, embedder.model())?.with_source(field.as_str());

    if let Err(e) = cache.save(&record).await {
        warn!("Could not persist embedding cache: {e}");
    }

    Ok(record.vectors)
}

/// Produces the search index for a corpus.
///
/// The only strategy shipped rebuilds everything on any change; an
/// incremental strategy would implement this trait too.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Build an index whose row `i` is `corpus.articles()[i]`.
    async fn build(
        &self,
        corpus: &Corpus,
        progress: &dyn ProgressSink,
    ) -> Result<Box<dyn VectorIndex>>;
}

/// Cache-backed full rebuild.
pub struct CachedFullRebuild {
    cache: EmbeddingCache,
    embedder: Embedder,
    field: EmbedField,
}

impl CachedFullRebuild {
    /// Create a builder.
    pub fn new(cache: EmbeddingCache, embedder: Embedder, field: EmbedField) -> Self {
        Self {
            cache,
            embedder,
            field,
        }
    }
}

#[async_trait]
impl IndexBuilder for CachedFullRebuild {
    async fn build(
        &self,
        corpus: &Corpus,
        progress: &dyn ProgressSink,
    ) -> Result<Box<dyn VectorIndex>> {
        let matrix =
            load_or_create_embeddings(corpus, &self.cache, &self.embedder, self.field, progress)
                .await?;
        Ok(Box::new(BruteForceIndex::new(corpus.ids(), matrix)?))
    }
}

/// Answers "which article fits this question best".
pub struct Retriever {
    corpus: Corpus,
    embedder: Embedder,
    index: Box<dyn VectorIndex>,
}

impl Retriever {
    /// Assemble a retriever from an already built index.
    pub fn new(corpus: Corpus, embedder: Embedder, index: Box<dyn VectorIndex>) -> Result<Self> {
        if index.len() != corpus.len() {
            return Err(EmbeddingError::RowCountMismatch {
                ids: corpus.len(),
                rows: index.len(),
            }
            .into());
        }
        Ok(Self {
            corpus,
            embedder,
            index,
        })
    }

    /// Build the index with `builder`, then assemble the retriever.
    pub async fn build(
        corpus: Corpus,
        embedder: Embedder,
        builder: &dyn IndexBuilder,
        progress: &dyn ProgressSink,
    ) -> Result<Self> {
        let index = builder.build(&corpus, progress).await?;
        Self::new(corpus, embedder, index)
    }

    /// The searched corpus.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    fn resolve(&self, hit: &IndexHit) -> Result<RetrievedArticle> {
        let article = self
            .corpus
            .get(hit.index)
            .ok_or(EmbeddingError::RowCountMismatch {
                ids: self.corpus.len(),
                rows: self.index.len(),
            })?;
        Ok(RetrievedArticle::new(article, hit.score))
    }

    /// Find the best article for `question`.
    ///
    /// Provider failures are returned as errors; no score is ever invented.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievedArticle> {
        let query = self.embedder.embed(Some(question)).await?;
        let hit = self.index.best_match(&query)?;
        debug!("Best match for question: {} (score {:.4})", hit.id, hit.score);
        self.resolve(&hit)
    }

    /// Find up to `k` articles for `question`, best first.
    pub async fn retrieve_top_k(&self, question: &str, k: usize) -> Result<Vec<RetrievedArticle>> {
        let query = self.embedder.embed(Some(question)).await?;
        self.index
            .top_k(&query, k, -1.0)?
            .iter()
            .map(|hit| self.resolve(hit))
            .collect()
    }
}
