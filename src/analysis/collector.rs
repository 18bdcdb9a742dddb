//! Per-article annotation.
//!
//! Each article is summarized, classified and tagged with topics through
//! the injected capabilities. Articles are annotated concurrently, but the
//! result always has the same length and order as the input, and a failing
//! capability only degrades the affected field of the affected article.

use crate::models::{
    Annotation, Article, Sentiment, MAX_TOPICS, NO_CONTENT_SUMMARY, NO_TOPICS, NO_TOPICS_FOUND,
};
use crate::nlp::{Capabilities, NlpError};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A capability failure for one article.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("summarizer failed for article {index}: {source}")]
    Summarizer {
        index: usize,
        #[source]
        source: NlpError,
    },

    #[error("sentiment classifier failed for article {index}: {source}")]
    Classifier {
        index: usize,
        #[source]
        source: NlpError,
    },

    #[error("keyphrase extractor failed for article {index}: {source}")]
    Extractor {
        index: usize,
        #[source]
        source: NlpError,
    },
}

/// Thresholds and limits applied while annotating.
#[derive(Debug, Clone)]
pub struct AnnotationPolicy {
    /// Articles with fewer characters get placeholder annotations.
    pub min_content_chars: usize,
    /// Topics kept per article.
    pub max_topics: usize,
    /// Length of the content prefix used when summarization fails.
    pub fallback_summary_chars: usize,
}

impl Default for AnnotationPolicy {
    fn default() -> Self {
        Self {
            min_content_chars: 50,
            max_topics: 3,
            fallback_summary_chars: 50,
        }
    }
}

/// Raw capability results for one article, before fallbacks.
#[derive(Debug)]
pub struct AnnotationAttempt {
    pub index: usize,
    pub summary: Result<String, AnnotationError>,
    pub sentiment: Result<Sentiment, AnnotationError>,
    pub topics: Result<Vec<String>, AnnotationError>,
}

impl AnnotationAttempt {
    /// Resolve every failed field to its fallback value.
    pub fn into_annotation(self, article: &Article, policy: &AnnotationPolicy) -> Annotation {
        let mut degraded = false;

        let summary = match self.summary.and_then(|s| {
            normalize_summary(&s).ok_or(AnnotationError::Summarizer {
                index: self.index,
                source: NlpError::Empty,
            })
        }) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Using content prefix as summary");
                degraded = true;
                fallback_summary(&article.content, policy.fallback_summary_chars)
            }
        };

        let sentiment = self.sentiment.unwrap_or_else(|e| {
            warn!(error = %e, "Using neutral sentiment");
            degraded = true;
            Sentiment::neutral()
        });

        let topics = match self.topics {
            Ok(raw) => normalize_topics(raw, policy.max_topics),
            Err(e) => {
                warn!(error = %e, "Using empty topic list");
                degraded = true;
                normalize_topics(Vec::new(), policy.max_topics)
            }
        };

        Annotation {
            title: article.title.clone(),
            summary,
            sentiment,
            topics,
            degraded,
        }
    }
}

/// Annotates batches of articles with injected capabilities.
pub struct Collector {
    capabilities: Capabilities,
    policy: AnnotationPolicy,
    concurrency: usize,
    show_progress: bool,
}

impl Collector {
    pub fn new(capabilities: Capabilities, policy: AnnotationPolicy) -> Self {
        Self {
            capabilities,
            policy,
            concurrency: 4,
            show_progress: false,
        }
    }

    /// Number of articles annotated at the same time (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Annotate every article. Same length and order as `articles`.
    pub async fn collect(&self, articles: &[Article]) -> Vec<Annotation> {
        info!(
            count = articles.len(),
            concurrency = self.concurrency,
            "Annotating articles"
        );

        let progress = self.progress_bar(articles.len());

        let annotations: Vec<Annotation> = stream::iter(articles.iter().enumerate())
            .map(|(index, article)| {
                let progress = progress.clone();
                async move {
                    let annotation = self.annotate(index, article).await;
                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }
                    annotation
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let degraded = annotations.iter().filter(|a| a.degraded).count();
        if degraded > 0 {
            warn!(degraded, "Some annotations use fallback values");
        }

        annotations
    }

    /// Annotate a single article, applying fallbacks.
    pub async fn annotate(&self, index: usize, article: &Article) -> Annotation {
        if article.content.chars().count() < self.policy.min_content_chars {
            debug!(index, title = %article.title, "Content too short; using placeholders");
            return placeholder_annotation(article);
        }

        self.try_annotate(index, article)
            .await
            .into_annotation(article, &self.policy)
    }

    /// Run the three capabilities concurrently without applying fallbacks.
    pub async fn try_annotate(&self, index: usize, article: &Article) -> AnnotationAttempt {
        let text = article.content.as_str();

        let (summary, sentiment, topics) = tokio::join!(
            self.capabilities.summarizer.summarize(text),
            self.capabilities.classifier.classify(text),
            self.capabilities.extractor.extract_topics(text),
        );

        debug!(index, title = %article.title, "Capabilities returned");

        AnnotationAttempt {
            index,
            summary: summary.map_err(|source| AnnotationError::Summarizer { index, source }),
            sentiment: sentiment.map_err(|source| AnnotationError::Classifier { index, source }),
            topics: topics.map_err(|source| AnnotationError::Extractor { index, source }),
        }
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.show_progress || len == 0 {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} articles")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

/// Annotation for an article without usable content.
pub fn placeholder_annotation(article: &Article) -> Annotation {
    Annotation {
        title: article.title.clone(),
        summary: NO_CONTENT_SUMMARY.to_string(),
        sentiment: Sentiment::neutral(),
        topics: vec![NO_TOPICS_FOUND.to_string()],
        degraded: false,
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Trimmed, capitalized, period-terminated summary; `None` when empty.
pub fn normalize_summary(summary: &str) -> Option<String> {
    let trimmed = summary.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut normalized = capitalize(trimmed);
    if !normalized.ends_with('.') {
        normalized.push('.');
    }
    Some(normalized)
}

/// Capitalized prefix of the content, used when summarization fails.
pub fn fallback_summary(content: &str, max_chars: usize) -> String {
    let prefix: String = content.chars().take(max_chars).collect();
    let prefix = capitalize(prefix.trim());
    if prefix.is_empty() {
        "No content available".to_string()
    } else {
        prefix
    }
}

/// Clean, deduplicate and cap extracted topics; never returns an empty list.
///
/// The cap is held within `1..=MAX_TOPICS` whatever `max_topics` says.
pub fn normalize_topics(raw: Vec<String>, max_topics: usize) -> Vec<String> {
    let limit = max_topics.clamp(1, MAX_TOPICS);
    let mut topics: Vec<String> = Vec::new();

    for topic in raw {
        let cleaned = topic.replace('_', " ").trim().to_string();
        if cleaned.is_empty() || topics.contains(&cleaned) {
            continue;
        }
        topics.push(cleaned);
        if topics.len() >= limit {
            break;
        }
    }

    if topics.is_empty() {
        topics.push(NO_TOPICS.to_string());
    }
    topics
}
