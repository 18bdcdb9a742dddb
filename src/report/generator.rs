//! Markdown and JSON report generation.
//!
//! Sentinels (no overlap, no coverage difference, empty unique-topic
//! lists) are rendered as-is so readers see why a section is empty.

use crate::models::{
    ArticleView, ComparativeSentiment, Report, RunMetadata, SentimentDistribution, SentimentLabel,
    NOT_AVAILABLE,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, metadata: &RunMetadata) -> String {
    let mut output = String::new();

    output.push_str(&format!("# News Coverage Report: {}\n\n", report.company));
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_articles_section(&report.articles));
    output.push_str(&generate_comparative_section(&report.comparative));
    output.push_str(&generate_verdict_section(&report.final_verdict));
    output.push_str(&generate_audio_section(report, metadata));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &RunMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!("- **Articles:** {}\n", metadata.articles));
    if metadata.degraded_annotations > 0 {
        section.push_str(&format!(
            "- **Annotations with fallbacks:** {}\n",
            metadata.degraded_annotations
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_articles_section(articles: &[ArticleView]) -> String {
    let mut section = String::new();

    section.push_str("## Articles\n\n");

    if articles.is_empty() {
        section.push_str("No articles were found.\n\n");
        return section;
    }

    for (i, article) in articles.iter().enumerate() {
        section.push_str(&format!("### {}. {}\n\n", i + 1, article.title));
        section.push_str(&format!(
            "- **Sentiment:** {} {}\n",
            article.sentiment.emoji(),
            article.sentiment
        ));
        section.push_str(&format!("- **Topics:** {}\n\n", article.topics.join(", ")));
        section.push_str(&format!("**Summary:** {}\n\n", article.summary));
        section.push_str("---\n\n");
    }

    section
}

fn generate_distribution_table(distribution: &SentimentDistribution) -> String {
    let mut table = String::new();

    let headers: Vec<String> = SentimentLabel::ALL
        .iter()
        .map(|label| format!("{} {}", label.emoji(), label))
        .collect();
    let counts: Vec<String> = SentimentLabel::ALL
        .iter()
        .map(|label| distribution.count(*label).to_string())
        .collect();

    table.push_str(&format!("| {} | **Total** |\n", headers.join(" | ")));
    table.push_str("|:---:|:---:|:---:|:---:|\n");
    table.push_str(&format!(
        "| {} | **{}** |\n\n",
        counts.join(" | "),
        distribution.total()
    ));

    table
}

fn generate_comparative_section(comparative: &ComparativeSentiment) -> String {
    let mut section = String::new();

    section.push_str("## Comparative Sentiment Score\n\n");

    section.push_str("### Sentiment Distribution\n\n");
    section.push_str(&generate_distribution_table(&comparative.sentiment_distribution));

    section.push_str("### Topic Overlap\n\n");
    section.push_str(&comparative.topic_overlap.rendered().join(", "));
    section.push_str("\n\n");

    section.push_str("### Coverage Differences\n\n");
    for difference in &comparative.coverage_differences {
        section.push_str(&format!(
            "- **{}:** {}\n",
            difference.comparison(),
            difference.impact()
        ));
    }
    section.push('\n');

    let overview = &comparative.topic_overview;
    section.push_str("### Topic Overview\n\n");
    section.push_str(&format!(
        "- **Topic Overlap:** {}\n",
        overview.topic_overlap.rendered().join(", ")
    ));
    for (label, topics) in overview.unique_topics.iter() {
        let rendered = if topics.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            topics.join(", ")
        };
        section.push_str(&format!("- **{}:** {}\n", label, rendered));
    }
    section.push('\n');

    section
}

fn generate_verdict_section(verdict: &str) -> String {
    format!("## Final Sentiment Analysis\n\n{}\n\n", verdict)
}

fn generate_audio_section(report: &Report, metadata: &RunMetadata) -> String {
    let mut section = String::from("## Audio Summary\n\n");

    match (&report.audio, &metadata.audio_file) {
        (Some(audio), Some(path)) => {
            section.push_str(&format!("🔊 [{}]({}) ({} bytes)\n\n", path, path, audio.len()))
        }
        (Some(audio), None) => {
            section.push_str(&format!("🔊 Audio digest generated ({} bytes).\n\n", audio.len()))
        }
        (None, _) => section.push_str("⚠️ Audio summary could not be generated.\n\n"),
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by NewsLens*\n".to_string()
}

/// Generate a JSON report with the stable field names.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::engine::aggregate;
    use crate::models::{Annotation, Sentiment};
    use chrono::Utc;

    fn annotation(title: &str, label: SentimentLabel, topics: &[&str]) -> Annotation {
        Annotation {
            title: title.to_string(),
            summary: format!("{} summary.", title),
            sentiment: Sentiment::new(label, 0.8),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            degraded: false,
        }
    }

    fn metadata(articles: usize) -> RunMetadata {
        RunMetadata {
            generated_at: Utc::now(),
            model_used: "test-model".to_string(),
            source: "file fixtures/articles.json".to_string(),
            articles,
            degraded_annotations: 1,
            duration_seconds: 3.2,
            audio_file: None,
        }
    }

    fn create_test_report() -> Report {
        let annotations = vec![
            annotation("Chips boom", SentimentLabel::Positive, &["ai", "chips"]),
            annotation("New rules", SentimentLabel::Negative, &["chips", "regulation"]),
            annotation("Chips again", SentimentLabel::Positive, &["chips"]),
        ];
        aggregate("Acme", &annotations, None)
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &metadata(3));

        assert!(markdown.contains("# News Coverage Report: Acme"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("**Annotations with fallbacks:** 1"));
        assert!(markdown.contains("### 2. New rules"));
        assert!(markdown.contains("- **Article 1 vs Article 2:** Article 1 focuses on: ai"));
        assert!(markdown.contains("- **Article 3:** Not Available"));
        assert!(markdown.contains("## Final Sentiment Analysis"));
        assert!(markdown.contains("Audio summary could not be generated."));
    }

    #[test]
    fn test_distribution_table() {
        let table = generate_distribution_table(&SentimentDistribution {
            positive: 2,
            negative: 1,
            neutral: 0,
        });
        assert!(table.contains("| 2 | 1 | 0 | **3** |"));
    }

    #[test]
    fn test_empty_report_renders_sentinels() {
        let report = aggregate("Acme", &[], None);
        let markdown = generate_markdown_report(&report, &metadata(0));

        assert!(markdown.contains("No articles were found."));
        assert!(markdown.contains("No overlap"));
        assert!(markdown.contains("- **Not Available:** No significant coverage difference is found"));
    }

    #[test]
    fn test_audio_section_with_file() {
        let mut report = create_test_report();
        report.audio = Some(vec![0; 16]);
        let mut meta = metadata(3);
        meta.audio_file = Some("digest.mp3".to_string());

        let section = generate_audio_section(&report, &meta);
        assert!(section.contains("[digest.mp3](digest.mp3) (16 bytes)"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"Company\""));
        assert!(json.contains("\"Comparative Sentiment Score\""));
        assert!(json.contains("\"Final Sentiment Analysis\""));
        assert!(json.contains("\"Audio\": null"));
    }
}
