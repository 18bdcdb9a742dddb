//! Article retrieval.
//!
//! Sources deliver the batch of articles a report is built from. A
//! retrieval failure is fatal to the run: there is nothing to annotate.

pub mod newsapi;
pub mod scrape;

pub use newsapi::{NewsApiConfig, NewsApiSource};

use crate::models::Article;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while fetching the article batch.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("NEWS_API_KEY not set (use --api-key, the environment or the config file)")]
    MissingApiKey,

    #[error("failed to fetch articles: {0}")]
    Request(String),

    #[error("news API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("news API reported an error: {0}")]
    Provider(String),

    #[error("failed to decode articles: {0}")]
    Decode(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A provider of articles for a search query.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_articles(&self, query: &str) -> Result<Vec<Article>, RetrievalError>;

    /// Short description used in logs and report metadata.
    fn describe(&self) -> String;
}

/// Reads a JSON array of `{title, content}` objects from disk.
///
/// The query is ignored: the file is the batch.
pub struct FileSource {
    path: PathBuf,
    max_articles: usize,
}

impl FileSource {
    pub fn new(path: &Path, max_articles: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            max_articles,
        }
    }
}

#[async_trait]
impl ArticleSource for FileSource {
    async fn fetch_articles(&self, _query: &str) -> Result<Vec<Article>, RetrievalError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| RetrievalError::Io {
                path: self.path.clone(),
                source,
            })?;

        let mut articles: Vec<Article> = serde_json::from_str(&content)
            .map_err(|e| RetrievalError::Decode(format!("{}: {}", self.path.display(), e)))?;
        articles.truncate(self.max_articles);

        info!(
            count = articles.len(),
            path = %self.path.display(),
            "Loaded articles from file"
        );
        Ok(articles)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_loads_and_truncates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "A", "content": "alpha"}}, {{"title": "B"}}, {{"title": "C", "content": "gamma"}}]"#
        )
        .unwrap();

        let source = FileSource::new(file.path(), 2);
        let articles = source.fetch_articles("ignored").await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0], Article::new("A", "alpha"));
        assert_eq!(articles[1].content, "");
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileSource::new(Path::new("/nonexistent/articles.json"), 10);
        let err = source.fetch_articles("x").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Io { .. }));
    }

    #[tokio::test]
    async fn test_file_source_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let source = FileSource::new(file.path(), 10);
        let err = source.fetch_articles("x").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fixture_batch_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/articles.json");
        let articles = FileSource::new(&path, 10).fetch_articles("Tesla").await.unwrap();
        assert!(!articles.is_empty());
        assert!(articles.len() <= 10);
    }
}
