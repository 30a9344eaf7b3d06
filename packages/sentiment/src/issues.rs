//! Recurring complaint mining over scored reviews.

use std::collections::BTreeMap;

use site_insight_analytics_models::{IssueQuotes, IssueSummary};
use site_insight_geography_models::SentimentLabel;

use crate::normalize::normalize_for_issues;
use crate::taxonomy::IssueTaxonomy;

/// Number of top categories that get representative quotes.
pub const QUOTED_CATEGORIES: usize = 8;

/// Quotes surfaced per category.
pub const QUOTES_PER_CATEGORY: usize = 3;

/// Words ignored when extracting phrases.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "with", "you", "your", "yours", "yourself", "yourselves",
];

/// A deduplicated review with its label, ready for mining.
#[derive(Debug, Clone, Copy)]
pub struct LabeledText<'a> {
    /// Original review text.
    pub text: &'a str,
    /// Sentiment label.
    pub label: SentimentLabel,
}

/// Counts category mentions among `reviews` and ranks the categories.
///
/// Categories are sorted by negative mentions, then all mentions, both
/// descending, with ties left in taxonomy order. Share of negatives is a
/// percentage rounded to one decimal, and 0.0 when there are no negative
/// reviews.
///
/// Counts and ranking do not depend on the order of `reviews`. The
/// `example_phrase` does when bigram counts tie, since [`top_bigram`]
/// gives ties to the pair seen first; equal-length quotes from
/// [`representative_quotes`] likewise follow input order.
#[must_use]
pub fn mine_issues(reviews: &[LabeledText<'_>], taxonomy: &IssueTaxonomy) -> Vec<IssueSummary> {
    let normalized: Vec<String> = reviews.iter().map(|r| normalize_for_issues(r.text)).collect();
    let total_negative = reviews
        .iter()
        .filter(|r| r.label == SentimentLabel::Negative)
        .count();

    let mut summaries: Vec<IssueSummary> = taxonomy
        .categories()
        .iter()
        .map(|category| {
            let mut all_mentions = 0;
            let mut negative_texts = Vec::new();
            for (review, text) in reviews.iter().zip(&normalized) {
                if !category.matches(text) {
                    continue;
                }
                all_mentions += 1;
                if review.label == SentimentLabel::Negative {
                    negative_texts.push(text.as_str());
                }
            }

            IssueSummary {
                issue: category.name().to_string(),
                negative_mentions: negative_texts.len(),
                share_of_negatives: share_percent(negative_texts.len(), total_negative),
                all_mentions,
                example_phrase: top_bigram(negative_texts),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.negative_mentions
            .cmp(&a.negative_mentions)
            .then(b.all_mentions.cmp(&a.all_mentions))
    });
    summaries
}

/// Whether any category was mentioned at all.
#[must_use]
pub fn has_recurring_issues(summaries: &[IssueSummary]) -> bool {
    summaries.iter().any(|s| s.all_mentions > 0)
}

/// Up to [`QUOTES_PER_CATEGORY`] shortest negative texts for each of the
/// first [`QUOTED_CATEGORIES`] ranked categories. Categories without
/// matching negative reviews are left out.
#[must_use]
pub fn representative_quotes(
    reviews: &[LabeledText<'_>],
    ranked: &[IssueSummary],
    taxonomy: &IssueTaxonomy,
) -> Vec<IssueQuotes> {
    let negatives: Vec<(&str, String)> = reviews
        .iter()
        .filter(|r| r.label == SentimentLabel::Negative)
        .map(|r| (r.text, normalize_for_issues(r.text)))
        .collect();
    let by_name: BTreeMap<&str, _> = taxonomy
        .categories()
        .iter()
        .map(|c| (c.name(), c))
        .collect();

    ranked
        .iter()
        .take(QUOTED_CATEGORIES)
        .filter_map(|summary| {
            let category = by_name.get(summary.issue.as_str())?;
            let mut quotes: Vec<&str> = negatives
                .iter()
                .filter(|(_, normalized)| category.matches(normalized))
                .map(|(text, _)| *text)
                .collect();
            if quotes.is_empty() {
                return None;
            }
            quotes.sort_by_key(|q| q.chars().count());
            quotes.truncate(QUOTES_PER_CATEGORY);
            Some(IssueQuotes {
                issue: summary.issue.clone(),
                quotes: quotes.into_iter().map(ToString::to_string).collect(),
            })
        })
        .collect()
}

/// Most frequent adjacent word pair across `texts`, ignoring stop words
/// and words of two characters or fewer. Ties go to the pair seen first.
#[must_use]
pub fn top_bigram<'a, I>(texts: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut next_seen = 0;

    for text in texts {
        let tokens: Vec<&str> = text
            .split_whitespace()
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
            .collect();
        for pair in tokens.windows(2) {
            let entry = counts
                .entry(format!("{} {}", pair[0], pair[1]))
                .or_insert_with(|| {
                    next_seen += 1;
                    (0, next_seen)
                });
            entry.0 += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, seen_a)), (_, (count_b, seen_b))| {
            count_a.cmp(count_b).then(seen_b.cmp(seen_a))
        })
        .map(|(phrase, _)| phrase)
}

fn share_percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = part as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
