//! Knowledge-base articles.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CorpusError, Result};

/// One knowledge-base article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Stable, unique identifier.
    pub id: String,

    /// Short summary.
    #[serde(default)]
    pub annotation: String,

    /// Full article body, used as generation context.
    #[serde(default)]
    pub text: String,

    /// Free-form tag metadata.
    #[serde(default)]
    pub tags: String,
}

impl Article {
    /// Create an article with only an id and an annotation.
    pub fn new(id: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            annotation: annotation.into(),
            text: String::new(),
            tags: String::new(),
        }
    }

    /// Set the full text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// The text embedded for this article under `field`.
    pub fn embedding_text(&self, field: EmbedField) -> &str {
        match field {
            EmbedField::Annotation => &self.annotation,
            EmbedField::Text => &self.text,
        }
    }
}

/// Which article field represents the article in vector space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedField {
    /// The short annotation; cheaper to embed than the full text.
    #[default]
    Annotation,
    /// The full article text.
    Text,
}

impl EmbedField {
    /// Stable name, as written in config files and the embedding cache.
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedField::Annotation => "annotation",
            EmbedField::Text => "text",
        }
    }
}

/// An ordered, immutable set of articles with unique ids.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    articles: Vec<Article>,
}

impl Corpus {
    /// Build a corpus, rejecting empty and duplicate ids.
    pub fn new(articles: Vec<Article>) -> std::result::Result<Self, CorpusError> {
        let mut seen = HashSet::with_capacity(articles.len());
        for (row, article) in articles.iter().enumerate() {
            if article.id.trim().is_empty() {
                return Err(CorpusError::EmptyId { row });
            }
            if !seen.insert(article.id.as_str()) {
                return Err(CorpusError::DuplicateId(article.id.clone()));
            }
        }
        Ok(Self { articles })
    }

    /// Read articles from CSV with `id`, `annotation`, `text` and `tags`
    /// columns. Missing cells become empty strings.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();
        if !headers.iter().any(|h| h == "id") {
            return Err(CorpusError::MissingColumn("id".to_string()).into());
        }

        let articles = csv
            .deserialize::<Article>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(articles)?)
    }

    /// Read articles from a CSV file.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let corpus = Self::from_reader(file)?;
        info!("Loaded {} articles from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Articles in load order.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Article at row `index`.
    pub fn get(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
    }

    /// Identifiers in load order.
    pub fn ids(&self) -> Vec<String> {
        self.articles.iter().map(|a| a.id.clone()).collect()
    }

    /// The texts to embed, one per article, in load order.
    pub fn embedding_texts(&self, field: EmbedField) -> Vec<String> {
        self.articles
            .iter()
            .map(|a| a.embedding_text(field).to_string())
            .collect()
    }

    /// Number of articles.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the corpus has no articles.
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_reader() {
        let data = "id,annotation,text,tags\n\
                    1,loans,\"Loans are borrowed money.\nRepaid monthly.\",\"['credit']\"\n\
                    2,,Deposits earn interest.,\n";
        let corpus = Corpus::from_reader(data.as_bytes()).unwrap();

        assert_eq!(corpus.ids(), vec!["1", "2"]);
        assert_eq!(corpus.articles()[0].text, "Loans are borrowed money.\nRepaid monthly.");
        assert_eq!(corpus.articles()[0].tags, "['credit']");
        assert_eq!(corpus.articles()[1].annotation, "");
        assert_eq!(
            corpus.embedding_texts(EmbedField::Text),
            vec!["Loans are borrowed money.\nRepaid monthly.", "Deposits earn interest."]
        );
    }

    #[test]
    fn test_extra_columns_ignored() {
        let data = "id,annotation,text,tags,source\n7,a,b,c,web\n";
        let corpus = Corpus::from_reader(data.as_bytes()).unwrap();
        assert_eq!(corpus.get(0), Some(&Article::new("7", "a").with_text("b").with_tags("c")));
    }

    #[test]
    fn test_missing_id_column() {
        let err = Corpus::from_reader("annotation,text\na,b\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Corpus(CorpusError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Corpus::new(vec![Article::new("1", "a"), Article::new("1", "b")]).unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateId(id) if id == "1"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = Corpus::new(vec![Article::new("1", "a"), Article::new(" ", "b")]).unwrap_err();
        assert!(matches!(err, CorpusError::EmptyId { row: 1 }));
    }

    #[test]
    fn test_embed_field_name_matches_serde() {
        for field in [EmbedField::Annotation, EmbedField::Text] {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
