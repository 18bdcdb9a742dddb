//! Report assembly and the spoken digest.

use crate::analysis::aggregator::unique_topics_per_article;
use crate::models::{
    article_label, Annotation, ComparativeSentiment, CoverageDifference, Report,
    SentimentDistribution, TopicOverlap, TopicOverview, UniqueTopics,
};
use crate::nlp::SpeechSynthesizer;
use tracing::{info, warn};

/// One-sentence digest of the batch, the input for speech synthesis.
pub fn digest_text(article_count: usize, distribution: &SentimentDistribution) -> String {
    format!(
        "Analysis of {} articles gives {} positive, {} negative, and {} neutral sentiments.",
        article_count, distribution.positive, distribution.negative, distribution.neutral
    )
}

/// Request the spoken digest; any failure yields `None`.
pub async fn synthesize_digest(
    synthesizer: Option<&dyn SpeechSynthesizer>,
    digest: &str,
) -> Option<Vec<u8>> {
    let synthesizer = synthesizer?;

    match synthesizer.synthesize_speech(digest).await {
        Ok(audio) => {
            info!(bytes = audio.len(), "Audio digest generated");
            Some(audio)
        }
        Err(e) => {
            warn!(error = %e, "Audio digest could not be generated");
            None
        }
    }
}

/// Combine the aggregation results into the final report.
pub fn assemble(
    company: &str,
    annotations: &[Annotation],
    overlap: TopicOverlap,
    coverage_differences: Vec<CoverageDifference>,
    distribution: SentimentDistribution,
    verdict: String,
    audio: Option<Vec<u8>>,
) -> Report {
    let unique_topics = UniqueTopics(
        unique_topics_per_article(annotations, &overlap)
            .into_iter()
            .enumerate()
            .map(|(index, topics)| (article_label(index), topics))
            .collect(),
    );

    Report {
        company: company.to_string(),
        articles: annotations.iter().map(Annotation::view).collect(),
        comparative: ComparativeSentiment {
            sentiment_distribution: distribution,
            topic_overlap: overlap.clone(),
            coverage_differences,
            topic_overview: TopicOverview {
                topic_overlap: overlap,
                unique_topics,
            },
        },
        final_verdict: verdict,
        audio,
    }
}
