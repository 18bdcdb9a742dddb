//! Data models for the news coverage analyzer.
//!
//! This module contains the core data structures used throughout the
//! application: articles, per-article annotations and the comparative
//! report. The serialized field names of the report are fixed here and
//! nowhere else, so consumers can render it without reinterpretation.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Summary used when an article has too little content to summarize.
pub const NO_CONTENT_SUMMARY: &str = "No content available to summarize";
/// Topic placeholder for articles with too little content.
pub const NO_TOPICS_FOUND: &str = "No topics found";
/// Topic placeholder when the extractor yields nothing.
pub const NO_TOPICS: &str = "No topics";
/// Rendered overlap when no topic is shared.
pub const NO_OVERLAP: &str = "No overlap";
/// Rendered placeholder for missing comparisons and empty topic lists.
pub const NOT_AVAILABLE: &str = "Not Available";
/// Impact text of the coverage-difference placeholder.
pub const NO_COVERAGE_DIFFERENCE: &str = "No significant coverage difference is found";

/// Most topics an annotation carries.
pub const MAX_TOPICS: usize = 3;

/// A news article as delivered by a retrieval source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Headline of the article.
    pub title: String,
    /// Body text (may be empty).
    #[serde(default)]
    pub content: String,
}

impl Article {
    /// Creates a new article.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Sentiment label assigned to an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// All labels, in majority tie-break priority order.
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    /// Returns the label name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }

    /// Returns an emoji representation of the label.
    pub fn emoji(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "🟢",
            SentimentLabel::Negative => "🔴",
            SentimentLabel::Neutral => "⚪",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lenient conversion from classifier output. Unknown labels are Neutral.
impl From<&str> for SentimentLabel {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" | "label_2" => SentimentLabel::Positive,
            "negative" | "label_0" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

/// Label and confidence produced by a sentiment classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Confidence in [0, 1].
    pub score: f64,
}

impl Sentiment {
    /// Creates a sentiment, clamping the score into [0, 1].
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { label, score }
    }

    /// The fallback sentiment: Neutral with zero confidence.
    pub fn neutral() -> Self {
        Self::new(SentimentLabel::Neutral, 0.0)
    }
}

/// Derived NLP results for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub title: String,
    pub summary: String,
    pub sentiment: Sentiment,
    /// Deduplicated, ordered topics (at most the configured maximum).
    pub topics: Vec<String>,
    /// True when any field holds a fallback value after a capability failure.
    #[serde(default)]
    pub degraded: bool,
}

impl Annotation {
    /// Returns the topics as a set.
    pub fn topic_set(&self) -> BTreeSet<&str> {
        self.topics.iter().map(String::as_str).collect()
    }

    /// Returns the per-article view used in the report.
    pub fn view(&self) -> ArticleView {
        ArticleView {
            title: self.title.clone(),
            summary: self.summary.clone(),
            sentiment: self.sentiment.label,
            topics: self.topics.clone(),
        }
    }
}

/// Per-article entry of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
    #[serde(rename = "Topics")]
    pub topics: Vec<String>,
}

/// Number of annotations per sentiment label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    #[serde(rename = "Positive")]
    pub positive: usize,
    #[serde(rename = "Negative")]
    pub negative: usize,
    #[serde(rename = "Neutral")]
    pub neutral: usize,
}

impl SentimentDistribution {
    /// Counts one annotation with the given label.
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    /// Returns the count for a label.
    pub fn count(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    /// Total number of annotations counted.
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Sums two partial distributions.
    pub fn merge(self, other: Self) -> Self {
        Self {
            positive: self.positive + other.positive,
            negative: self.negative + other.negative,
            neutral: self.neutral + other.neutral,
        }
    }
}

/// Confidence scores grouped by label, in annotation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentScores {
    positive: Vec<f64>,
    negative: Vec<f64>,
    neutral: Vec<f64>,
}

impl SentimentScores {
    /// Appends a score to the list of its label.
    pub fn push(&mut self, label: SentimentLabel, score: f64) {
        self.list_mut(label).push(score);
    }

    /// Returns the scores recorded for a label.
    pub fn scores(&self, label: SentimentLabel) -> &[f64] {
        match label {
            SentimentLabel::Positive => &self.positive,
            SentimentLabel::Negative => &self.negative,
            SentimentLabel::Neutral => &self.neutral,
        }
    }

    /// Arithmetic mean of a label's scores, 0 when there are none.
    pub fn average(&self, label: SentimentLabel) -> f64 {
        let scores = self.scores(label);
        if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }

    /// Concatenates two partial score lists, `self` first.
    pub fn merge(mut self, other: Self) -> Self {
        self.positive.extend(other.positive);
        self.negative.extend(other.negative);
        self.neutral.extend(other.neutral);
        self
    }

    fn list_mut(&mut self, label: SentimentLabel) -> &mut Vec<f64> {
        match label {
            SentimentLabel::Positive => &mut self.positive,
            SentimentLabel::Negative => &mut self.negative,
            SentimentLabel::Neutral => &mut self.neutral,
        }
    }
}

/// Topics that occur in two or more articles.
///
/// `NoOverlap` is the explicit "nothing shared" marker; it renders as
/// `["No overlap"]` but never behaves like a real topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOverlap {
    /// Shared topics in order of first appearance.
    Shared(Vec<String>),
    NoOverlap,
}

impl TopicOverlap {
    /// Wraps a list of shared topics, using `NoOverlap` for an empty list.
    pub fn from_topics(topics: Vec<String>) -> Self {
        if topics.is_empty() {
            TopicOverlap::NoOverlap
        } else {
            TopicOverlap::Shared(topics)
        }
    }

    /// Real shared topics (empty for `NoOverlap`).
    pub fn topics(&self) -> &[String] {
        match self {
            TopicOverlap::Shared(topics) => topics,
            TopicOverlap::NoOverlap => &[],
        }
    }

    /// First shared topic, if any.
    pub fn first(&self) -> Option<&str> {
        self.topics().first().map(String::as_str)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics().iter().any(|t| t == topic)
    }

    /// Topics as rendered for display, with the placeholder for no overlap.
    pub fn rendered(&self) -> Vec<String> {
        match self {
            TopicOverlap::Shared(topics) => topics.clone(),
            TopicOverlap::NoOverlap => vec![NO_OVERLAP.to_string()],
        }
    }
}

impl Serialize for TopicOverlap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = self.rendered();
        let mut seq = serializer.serialize_seq(Some(rendered.len()))?;
        for topic in &rendered {
            seq.serialize_element(topic)?;
        }
        seq.end()
    }
}

/// Label of an article in comparisons, 1-based.
pub fn article_label(index: usize) -> String {
    format!("Article {}", index + 1)
}

/// Topics exclusive to each side of an article pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageDifference {
    /// Pair `(first, second)` with `first < second`, at least one side nonempty.
    Pair {
        first: usize,
        second: usize,
        unique_to_first: BTreeSet<String>,
        unique_to_second: BTreeSet<String>,
    },
    /// No pair differs (including batches of fewer than two articles).
    NotFound,
}

impl CoverageDifference {
    /// Article indices of the pair, if this is a real entry.
    pub fn pair(&self) -> Option<(usize, usize)> {
        match self {
            CoverageDifference::Pair { first, second, .. } => Some((*first, *second)),
            CoverageDifference::NotFound => None,
        }
    }

    /// The `Comparison` text, e.g. `Article 1 vs Article 2`.
    pub fn comparison(&self) -> String {
        match self.pair() {
            Some((first, second)) => {
                format!("{} vs {}", article_label(first), article_label(second))
            }
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// The `Impact` text describing what each side covers alone.
    pub fn impact(&self) -> String {
        match self {
            CoverageDifference::Pair {
                first,
                second,
                unique_to_first,
                unique_to_second,
            } => format!(
                "{} focuses on: {}, while {} discusses: {}.",
                article_label(*first),
                describe_topics(unique_to_first),
                article_label(*second),
                describe_topics(unique_to_second)
            ),
            CoverageDifference::NotFound => NO_COVERAGE_DIFFERENCE.to_string(),
        }
    }
}

fn describe_topics(topics: &BTreeSet<String>) -> String {
    if topics.is_empty() {
        "no unique topics".to_string()
    } else {
        topics.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl Serialize for CoverageDifference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CoverageDifference", 2)?;
        state.serialize_field("Comparison", &self.comparison())?;
        state.serialize_field("Impact", &self.impact())?;
        state.end()
    }
}

/// Topics of each article that no other article shares, keyed by article label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueTopics(pub Vec<(String, Vec<String>)>);

impl UniqueTopics {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for UniqueTopics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, topics) in &self.0 {
            map.serialize_entry(label, topics)?;
        }
        map.end()
    }
}

/// Overlap plus what each article covers alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicOverview {
    #[serde(rename = "Topic Overlap")]
    pub topic_overlap: TopicOverlap,
    #[serde(rename = "Unique Topics per Article")]
    pub unique_topics: UniqueTopics,
}

/// The cross-article comparison section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeSentiment {
    #[serde(rename = "Sentiment Distribution")]
    pub sentiment_distribution: SentimentDistribution,
    #[serde(rename = "Topic Overlap")]
    pub topic_overlap: TopicOverlap,
    #[serde(rename = "Coverage Differences")]
    pub coverage_differences: Vec<CoverageDifference>,
    #[serde(rename = "Topic Overview")]
    pub topic_overview: TopicOverview,
}

/// The complete comparative coverage report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Articles")]
    pub articles: Vec<ArticleView>,
    #[serde(rename = "Comparative Sentiment Score")]
    pub comparative: ComparativeSentiment,
    #[serde(rename = "Final Sentiment Analysis")]
    pub final_verdict: String,
    /// Spoken digest (MP3), absent when synthesis failed or was disabled.
    #[serde(rename = "Audio")]
    pub audio: Option<Vec<u8>>,
}

/// Metadata about a report-generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Name of the LLM model used for annotation.
    pub model_used: String,
    /// Where the articles came from.
    pub source: String,
    /// Number of articles annotated.
    pub articles: usize,
    /// Annotations carrying at least one fallback value.
    pub degraded_annotations: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
    /// Where the audio digest was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}
