//! NewsAPI (`/v2/everything`) article source.

use crate::models::Article;
use crate::news::scrape::fetch_page_text;
use crate::news::{ArticleSource, RetrievalError};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Content used when neither the provider nor the page has any text.
const NO_CONTENT: &str = "No content available";
const NO_TITLE: &str = "No title available";
/// Pages re-fetched at the same time.
const PAGE_FETCH_CONCURRENCY: usize = 4;

/// Settings for the NewsAPI source.
#[derive(Debug, Clone)]
pub struct NewsApiConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_articles: usize,
    pub sort_by: String,
    /// Only articles published within this many days.
    pub lookback_days: Option<i64>,
    pub scrape_pages: bool,
    pub scrape_timeout_seconds: u64,
    pub max_page_chars: usize,
    pub timeout_seconds: u64,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            api_key: None,
            max_articles: 10,
            sort_by: "publishedAt".to_string(),
            lookback_days: None,
            scrape_pages: true,
            scrape_timeout_seconds: 10,
            max_page_chars: 1000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Clone, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl NewsApiArticle {
    /// Provider text: `content` when present, else `description`.
    fn provider_text(&self) -> String {
        let content = self
            .content
            .as_deref()
            .map(strip_truncation_marker)
            .filter(|c| !c.trim().is_empty());
        let description = self.description.as_deref().filter(|d| !d.trim().is_empty());

        content.or(description).unwrap_or_default().trim().to_string()
    }

    fn title(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(NO_TITLE)
            .to_string()
    }
}

/// NewsAPI appends `" [+1234 chars]"` to truncated content.
fn strip_truncation_marker(content: &str) -> &str {
    match content.rfind(" [+") {
        Some(pos) if content.ends_with("chars]") => &content[..pos],
        _ => content,
    }
}

/// Article source backed by NewsAPI, with optional page re-fetch.
pub struct NewsApiSource {
    config: NewsApiConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl NewsApiSource {
    pub fn new(config: NewsApiConfig) -> Result<Self, RetrievalError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RetrievalError::MissingApiKey)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("newslens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RetrievalError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<NewsApiArticle>, RetrievalError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("sortBy", self.config.sort_by.clone()),
            ("pageSize", self.config.max_articles.to_string()),
            ("apiKey", self.api_key.clone()),
        ];
        if let Some(days) = self.config.lookback_days {
            let from = Utc::now() - ChronoDuration::days(days);
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }

        info!(%query, endpoint = %self.config.endpoint, "Searching news");

        let response = self
            .http_client
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| RetrievalError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::Request(e.to_string()))?;
        parse_response(&body)
    }

    /// Final content for one article: page text unless the page is
    /// unreachable or script-rendered, in which case provider text.
    async fn resolve_content(&self, item: &NewsApiArticle) -> String {
        let provider_text = item.provider_text();

        let url = match item.url.as_deref() {
            Some(url) if self.config.scrape_pages && !url.is_empty() => url,
            _ => return or_placeholder(provider_text),
        };

        let timeout = Duration::from_secs(self.config.scrape_timeout_seconds);
        match fetch_page_text(&self.http_client, url, timeout, self.config.max_page_chars).await {
            Ok(page) if page.looks_script_rendered() => {
                info!(title = %item.title(), "Skipping page: likely script-rendered");
                or_placeholder(provider_text)
            }
            Ok(page) => or_placeholder(page.text),
            Err(e) => {
                warn!(%url, error = %e, "Failed to extract page content");
                or_placeholder(provider_text)
            }
        }
    }

    /// Resolve content for every item concurrently, keeping provider order.
    async fn resolve_articles(&self, items: Vec<NewsApiArticle>) -> Vec<Article> {
        stream::iter(items)
            .map(|item| async move { Article::new(item.title(), self.resolve_content(&item).await) })
            .buffered(PAGE_FETCH_CONCURRENCY)
            .collect()
            .await
    }
}

fn or_placeholder(content: String) -> String {
    if content.trim().is_empty() {
        NO_CONTENT.to_string()
    } else {
        content
    }
}

fn parse_response(body: &str) -> Result<Vec<NewsApiArticle>, RetrievalError> {
    let response: NewsApiResponse =
        serde_json::from_str(body).map_err(|e| RetrievalError::Decode(e.to_string()))?;

    if response.status != "ok" {
        return Err(RetrievalError::Provider(
            response.message.unwrap_or(response.status),
        ));
    }
    Ok(response.articles)
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    async fn fetch_articles(&self, query: &str) -> Result<Vec<Article>, RetrievalError> {
        let mut items = self.search(query).await?;
        items.truncate(self.config.max_articles);
        debug!(count = items.len(), "Provider returned articles");

        let articles = self.resolve_articles(items).await;

        if articles.len() < self.config.max_articles {
            warn!(
                found = articles.len(),
                wanted = self.config.max_articles,
                %query,
                "Found fewer articles than requested"
            );
        }

        Ok(articles)
    }

    fn describe(&self) -> String {
        format!("NewsAPI ({})", self.config.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: Option<&str>, description: Option<&str>) -> NewsApiArticle {
        NewsApiArticle {
            title: Some("Title".to_string()),
            description: description.map(String::from),
            url: None,
            content: content.map(String::from),
        }
    }

    #[test]
    fn test_missing_api_key() {
        let result = NewsApiSource::new(NewsApiConfig::default());
        assert!(matches!(result, Err(RetrievalError::MissingApiKey)));

        let blank = NewsApiSource::new(NewsApiConfig {
            api_key: Some("  ".to_string()),
            ..NewsApiConfig::default()
        });
        assert!(matches!(blank, Err(RetrievalError::MissingApiKey)));
    }

    #[test]
    fn test_provider_text_prefers_content() {
        assert_eq!(item(Some("body"), Some("desc")).provider_text(), "body");
        assert_eq!(item(None, Some("desc")).provider_text(), "desc");
        assert_eq!(item(Some("  "), Some("desc")).provider_text(), "desc");
        assert_eq!(item(None, None).provider_text(), "");
    }

    #[test]
    fn test_strip_truncation_marker() {
        assert_eq!(
            strip_truncation_marker("Shares rose after the deal… [+2714 chars]"),
            "Shares rose after the deal…"
        );
        assert_eq!(strip_truncation_marker("No marker [+ here"), "No marker [+ here");
    }

    #[test]
    fn test_title_default() {
        let mut untitled = item(None, None);
        untitled.title = None;
        assert_eq!(untitled.title(), NO_TITLE);
    }

    #[test]
    fn test_parse_response_ok() {
        let body = r#"{"status": "ok", "totalResults": 2, "articles": [
            {"title": "A", "description": "d", "url": "https://example.com/a", "content": "c"},
            {"title": null, "description": null, "url": null, "content": null}
        ]}"#;
        let articles = parse_response(body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].provider_text(), "c");
        assert_eq!(articles[1].title(), NO_TITLE);
    }

    #[test]
    fn test_parse_response_provider_error() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        match parse_response(body) {
            Err(RetrievalError::Provider(message)) => assert_eq!(message, "Your API key is invalid."),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_content_without_scraping() {
        let source = NewsApiSource::new(NewsApiConfig {
            api_key: Some("key".to_string()),
            scrape_pages: false,
            ..NewsApiConfig::default()
        })
        .unwrap();

        let mut with_url = item(Some("provider body"), None);
        with_url.url = Some("https://example.com/a".to_string());
        assert_eq!(source.resolve_content(&with_url).await, "provider body");
        assert_eq!(source.resolve_content(&item(None, None)).await, NO_CONTENT);
    }

    #[tokio::test]
    async fn test_resolve_articles_keeps_order_on_spawned_task() {
        let source = NewsApiSource::new(NewsApiConfig {
            api_key: Some("key".to_string()),
            scrape_pages: false,
            ..NewsApiConfig::default()
        })
        .unwrap();

        let items: Vec<NewsApiArticle> = (0..6)
            .map(|i| {
                let mut entry = item(Some(&format!("body {}", i)), None);
                entry.title = Some(format!("Title {}", i));
                entry
            })
            .collect();

        let articles = tokio::spawn(async move { source.resolve_articles(items).await })
            .await
            .unwrap();

        assert_eq!(articles.len(), 6);
        for (i, article) in articles.iter().enumerate() {
            assert_eq!(article, &Article::new(format!("Title {}", i), format!("body {}", i)));
        }
    }

    #[tokio::test]
    async fn test_resolve_content_unreachable_page_keeps_provider_text() {
        let source = NewsApiSource::new(NewsApiConfig {
            api_key: Some("key".to_string()),
            scrape_timeout_seconds: 2,
            ..NewsApiConfig::default()
        })
        .unwrap();

        let mut unreachable = item(None, Some("provider description"));
        unreachable.url = Some("http://127.0.0.1:9/article".to_string());
        assert_eq!(
            source.resolve_content(&unreachable).await,
            "provider description"
        );
    }
}
