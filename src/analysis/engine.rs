//! The report aggregation engine.
//!
//! Annotation runs concurrently; everything after the join is a
//! single-threaded, deterministic reduction over the completed batch.

use crate::analysis::aggregator::{aggregate_sentiment, coverage_differences, topic_overlap};
use crate::analysis::assembler::{assemble, digest_text, synthesize_digest};
use crate::analysis::collector::Collector;
use crate::analysis::verdict::compose_verdict;
use crate::models::{Annotation, Article, Report};
use crate::nlp::SpeechSynthesizer;
use std::sync::Arc;
use tracing::info;

/// A finished report and the annotations it was built from.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub report: Report,
    pub annotations: Vec<Annotation>,
}

impl EngineOutput {
    /// Annotations carrying at least one fallback value.
    pub fn degraded_annotations(&self) -> usize {
        self.annotations.iter().filter(|a| a.degraded).count()
    }
}

/// Turns a batch of articles into a comparative report.
pub struct ReportEngine {
    collector: Collector,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ReportEngine {
    pub fn new(collector: Collector, speech: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { collector, speech }
    }

    /// Annotate, aggregate and assemble. Never fails: capability errors
    /// degrade content, a failed synthesis leaves `audio` empty.
    pub async fn generate(&self, company: &str, articles: &[Article]) -> EngineOutput {
        let annotations = self.collector.collect(articles).await;

        let (distribution, _) = aggregate_sentiment(&annotations);
        let digest = digest_text(annotations.len(), &distribution);
        let audio = synthesize_digest(self.speech.as_deref(), &digest).await;

        let report = aggregate(company, &annotations, audio);
        info!(
            company,
            articles = report.articles.len(),
            audio = report.audio.is_some(),
            "Report assembled"
        );

        EngineOutput {
            report,
            annotations,
        }
    }
}

/// The synchronous aggregation stages over a completed annotation batch.
pub fn aggregate(company: &str, annotations: &[Annotation], audio: Option<Vec<u8>>) -> Report {
    let overlap = topic_overlap(annotations);
    let differences = coverage_differences(annotations);
    let (distribution, scores) = aggregate_sentiment(annotations);
    let verdict = compose_verdict(&distribution, &scores, company, &overlap);

    assemble(
        company,
        annotations,
        overlap,
        differences,
        distribution,
        verdict,
        audio,
    )
}
