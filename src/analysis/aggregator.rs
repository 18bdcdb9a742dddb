//! Cross-article aggregation.
//!
//! Pure, deterministic reductions over a completed batch of annotations:
//! shared topics, pairwise coverage differences and sentiment tallies.
//! Article indices are the article identifiers throughout.

use crate::models::{
    Annotation, CoverageDifference, SentimentDistribution, SentimentScores, TopicOverlap,
};
use std::collections::{BTreeSet, HashMap};

/// Topics occurring in two or more annotations, in order of first appearance.
pub fn topic_overlap(annotations: &[Annotation]) -> TopicOverlap {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for topic in annotations.iter().flat_map(|a| a.topics.iter()) {
        let count = counts.entry(topic.as_str()).or_insert(0);
        if *count == 0 {
            order.push(topic.as_str());
        }
        *count += 1;
    }

    let shared = order
        .into_iter()
        .filter(|topic| counts.get(topic).copied().unwrap_or(0) > 1)
        .map(String::from)
        .collect();

    TopicOverlap::from_topics(shared)
}

/// Topics unique to each side of every article pair `(i, j)`, `i < j`.
///
/// Pairs come out in `(0,1), (0,2), .., (1,2), ..` order; pairs with
/// identical topic sets are omitted. When nothing differs the result is
/// the single `NotFound` entry.
pub fn coverage_differences(annotations: &[Annotation]) -> Vec<CoverageDifference> {
    let topic_sets: Vec<BTreeSet<&str>> = annotations.iter().map(Annotation::topic_set).collect();

    let mut differences = Vec::new();
    for (first, first_topics) in topic_sets.iter().enumerate() {
        for (second, second_topics) in topic_sets.iter().enumerate().skip(first + 1) {
            let unique_to_first = difference(first_topics, second_topics);
            let unique_to_second = difference(second_topics, first_topics);

            if unique_to_first.is_empty() && unique_to_second.is_empty() {
                continue;
            }

            differences.push(CoverageDifference::Pair {
                first,
                second,
                unique_to_first,
                unique_to_second,
            });
        }
    }

    if differences.is_empty() {
        differences.push(CoverageDifference::NotFound);
    }
    differences
}

fn difference(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> BTreeSet<String> {
    a.difference(b).map(|topic| topic.to_string()).collect()
}

/// Label counts and per-label scores.
///
/// Each annotation is tallied on its own and the partial results merged,
/// so any split of the batch reduces to the same totals.
pub fn aggregate_sentiment(annotations: &[Annotation]) -> (SentimentDistribution, SentimentScores) {
    annotations
        .iter()
        .map(|annotation| {
            let mut distribution = SentimentDistribution::default();
            let mut scores = SentimentScores::default();
            distribution.record(annotation.sentiment.label);
            scores.push(annotation.sentiment.label, annotation.sentiment.score);
            (distribution, scores)
        })
        .fold(
            (SentimentDistribution::default(), SentimentScores::default()),
            |(distribution, scores), (one_distribution, one_scores)| {
                (distribution.merge(one_distribution), scores.merge(one_scores))
            },
        )
}

/// Topics of each annotation not in the overlap, keeping the article's order.
pub fn unique_topics_per_article(
    annotations: &[Annotation],
    overlap: &TopicOverlap,
) -> Vec<Vec<String>> {
    annotations
        .iter()
        .map(|annotation| {
            annotation
                .topics
                .iter()
                .filter(|topic| !overlap.contains(topic))
                .cloned()
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sentiment, SentimentLabel};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn annotation(topics: &[&str], label: SentimentLabel, score: f64) -> Annotation {
        Annotation {
            title: "Test article".to_string(),
            summary: "Summary.".to_string(),
            sentiment: Sentiment::new(label, score),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            degraded: false,
        }
    }

    fn topics(items: &[&str]) -> Annotation {
        annotation(items, SentimentLabel::Neutral, 0.5)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Random batches of up to 10 articles with up to 3 distinct topics each.
    fn random_batch(rng: &mut StdRng) -> Vec<Annotation> {
        const POOL: [&str; 8] = ["ai", "chips", "regulation", "earnings", "layoffs", "china", "ev", "tariffs"];

        let n = rng.random_range(0..=10);
        (0..n)
            .map(|_| {
                let k = rng.random_range(1..=3);
                let mut chosen: Vec<&str> = Vec::new();
                while chosen.len() < k {
                    let topic = POOL[rng.random_range(0..POOL.len())];
                    if !chosen.contains(&topic) {
                        chosen.push(topic);
                    }
                }
                topics(&chosen)
            })
            .collect()
    }

    #[test]
    fn test_overlap_two_articles() {
        let batch = vec![topics(&["ai", "chips"]), topics(&["chips", "regulation"])];
        assert_eq!(
            topic_overlap(&batch),
            TopicOverlap::Shared(vec!["chips".to_string()])
        );
    }

    #[test]
    fn test_overlap_first_appearance_order() {
        let batch = vec![
            topics(&["ev", "ai"]),
            topics(&["ai", "tariffs"]),
            topics(&["tariffs", "ev"]),
        ];
        assert_eq!(
            topic_overlap(&batch).topics(),
            &["ev".to_string(), "ai".to_string(), "tariffs".to_string()]
        );
    }

    #[test]
    fn test_overlap_empty_inputs() {
        assert_eq!(topic_overlap(&[]), TopicOverlap::NoOverlap);
        assert_eq!(
            topic_overlap(&[topics(&["ai"]), topics(&["chips"])]),
            TopicOverlap::NoOverlap
        );
    }

    #[test]
    fn test_coverage_two_articles() {
        let batch = vec![topics(&["ai", "chips"]), topics(&["chips", "regulation"])];
        let diffs = coverage_differences(&batch);

        assert_eq!(
            diffs,
            vec![CoverageDifference::Pair {
                first: 0,
                second: 1,
                unique_to_first: set(&["ai"]),
                unique_to_second: set(&["regulation"]),
            }]
        );
    }

    #[test]
    fn test_coverage_pair_order_and_identical_sets() {
        let batch = vec![
            topics(&["ai"]),
            topics(&["ai"]),
            topics(&["chips"]),
            topics(&["ai", "chips"]),
        ];
        let pairs: Vec<_> = coverage_differences(&batch)
            .iter()
            .filter_map(CoverageDifference::pair)
            .collect();

        assert_eq!(pairs, vec![(0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_coverage_one_sided_difference() {
        let batch = vec![topics(&["ai", "chips"]), topics(&["chips"])];
        match &coverage_differences(&batch)[0] {
            CoverageDifference::Pair {
                unique_to_first,
                unique_to_second,
                ..
            } => {
                assert_eq!(unique_to_first, &set(&["ai"]));
                assert!(unique_to_second.is_empty());
            }
            CoverageDifference::NotFound => panic!("expected a pair"),
        }
    }

    #[test]
    fn test_coverage_degenerate_batches() {
        assert_eq!(coverage_differences(&[]), vec![CoverageDifference::NotFound]);
        assert_eq!(
            coverage_differences(&[topics(&["ai"])]),
            vec![CoverageDifference::NotFound]
        );
        assert_eq!(
            coverage_differences(&[topics(&["ai", "ev"]), topics(&["ev", "ai"])]),
            vec![CoverageDifference::NotFound]
        );
    }

    #[test]
    fn test_aggregate_sentiment() {
        let batch = vec![
            annotation(&["a"], SentimentLabel::Positive, 0.9),
            annotation(&["b"], SentimentLabel::Negative, 0.6),
            annotation(&["c"], SentimentLabel::Positive, 0.7),
        ];
        let (distribution, scores) = aggregate_sentiment(&batch);

        assert_eq!(distribution.positive, 2);
        assert_eq!(distribution.negative, 1);
        assert_eq!(distribution.neutral, 0);
        assert_eq!(scores.scores(SentimentLabel::Positive), &[0.9, 0.7]);
        assert_eq!(scores.scores(SentimentLabel::Negative), &[0.6]);
    }

    #[test]
    fn test_aggregate_partial_reductions_merge() {
        let mut rng = StdRng::seed_from_u64(3);
        let batch: Vec<Annotation> = (0..9)
            .map(|i| {
                let label = SentimentLabel::ALL[rng.random_range(0..3)];
                annotation(&["t"], label, i as f64 / 10.0)
            })
            .collect();

        let (whole_dist, whole_scores) = aggregate_sentiment(&batch);
        let (left_dist, left_scores) = aggregate_sentiment(&batch[..4]);
        let (right_dist, right_scores) = aggregate_sentiment(&batch[4..]);

        assert_eq!(left_dist.merge(right_dist), whole_dist);
        assert_eq!(left_scores.merge(right_scores), whole_scores);
    }

    #[test]
    fn test_unique_topics_per_article() {
        let batch = vec![
            topics(&["ai", "chips"]),
            topics(&["chips", "regulation"]),
            topics(&["chips"]),
        ];
        let overlap = topic_overlap(&batch);
        let unique = unique_topics_per_article(&batch, &overlap);

        assert_eq!(
            unique,
            vec![
                vec!["ai".to_string()],
                vec!["regulation".to_string()],
                Vec::<String>::new()
            ]
        );
    }

    #[test]
    fn test_randomized_properties() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let batch = random_batch(&mut rng);
            let n = batch.len();

            // Distribution sums to the batch size.
            let (distribution, _) = aggregate_sentiment(&batch);
            assert_eq!(distribution.total(), n);

            // Overlap membership iff the topic is in >= 2 articles.
            let overlap = topic_overlap(&batch);
            let all_topics: BTreeSet<&str> =
                batch.iter().flat_map(|a| a.topics.iter().map(String::as_str)).collect();
            for topic in all_topics {
                let articles_with = batch.iter().filter(|a| a.topics.iter().any(|t| t == topic)).count();
                assert_eq!(overlap.contains(topic), articles_with >= 2, "topic {}", topic);
            }

            // Entry for (i, j) iff the topic sets differ; bounded by C(n, 2).
            let diffs = coverage_differences(&batch);
            let pairs: Vec<(usize, usize)> = diffs.iter().filter_map(CoverageDifference::pair).collect();
            assert!(pairs.len() <= n * n.saturating_sub(1) / 2);
            for i in 0..n {
                for j in (i + 1)..n {
                    let differ = batch[i].topic_set() != batch[j].topic_set();
                    assert_eq!(pairs.contains(&(i, j)), differ);
                }
            }
            if pairs.is_empty() {
                assert_eq!(diffs, vec![CoverageDifference::NotFound]);
            }

            // Pairs are strictly ascending.
            assert!(pairs.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
