//! Final sentiment verdict.
//!
//! The majority label is the one with the highest count; ties resolve in
//! the fixed priority order Positive, Negative, Neutral. Confidence is
//! graded from the mean score of the majority label.

use crate::models::{SentimentDistribution, SentimentLabel, SentimentScores, TopicOverlap};
use std::fmt;

/// Qualitative grade of an averaged sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBucket {
    Strong,
    Moderate,
    Weak,
}

impl ConfidenceBucket {
    /// `> 0.75` strong, `> 0.5` moderate, otherwise weak.
    pub fn from_score(avg_score: f64) -> Self {
        if avg_score > 0.75 {
            ConfidenceBucket::Strong
        } else if avg_score > 0.5 {
            ConfidenceBucket::Moderate
        } else {
            ConfidenceBucket::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBucket::Strong => "strong",
            ConfidenceBucket::Moderate => "moderate",
            ConfidenceBucket::Weak => "weak",
        }
    }
}

impl fmt::Display for ConfidenceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label with the highest count; first in `SentimentLabel::ALL` on ties.
pub fn majority_label(distribution: &SentimentDistribution) -> SentimentLabel {
    let max = SentimentLabel::ALL
        .iter()
        .map(|label| distribution.count(*label))
        .max()
        .unwrap_or(0);

    SentimentLabel::ALL
        .into_iter()
        .find(|label| distribution.count(*label) == max)
        .unwrap_or(SentimentLabel::Neutral)
}

/// Explanatory sentence naming the company, majority label, confidence
/// grade and average score, followed by a cause clause.
pub fn compose_verdict(
    distribution: &SentimentDistribution,
    scores: &SentimentScores,
    company: &str,
    overlap: &TopicOverlap,
) -> String {
    if distribution.total() == 0 {
        return format!(
            "No articles were available to assess the sentiment towards {}.",
            company
        );
    }

    let majority = majority_label(distribution);
    let avg_score = scores.average(majority);
    let bucket = ConfidenceBucket::from_score(avg_score);

    let mut explanation = format!(
        "The overall sentiment towards {} is {} with a {} confidence (average score: {:.2}). ",
        company,
        majority.as_str().to_lowercase(),
        bucket,
        avg_score
    );

    let cause = match (majority, overlap.first()) {
        (SentimentLabel::Positive, topic) => format!(
            "This suggests favorable news coverage, likely driven by {}.",
            topic.unwrap_or("recent developments")
        ),
        (SentimentLabel::Negative, topic) => format!(
            "This indicates unfavorable news coverage, possibly due to {}.",
            topic.unwrap_or("recent challenges")
        ),
        (SentimentLabel::Neutral, _) => "This suggests a balanced view.".to_string(),
    };
    explanation.push_str(&cause);

    explanation
}
