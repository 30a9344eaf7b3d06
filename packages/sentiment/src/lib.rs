#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Review sentiment and recurring issue mining.
//!
//! Reviews attributed to a unit are cleaned, deduplicated, scored through
//! a pluggable [`SentimentScorer`], summarized against a mean-of-unit-shares
//! baseline, and mined for complaint categories from an
//! [`IssueTaxonomy`].

pub mod dedup;
pub mod issues;
pub mod normalize;
pub mod scorer;
pub mod taxonomy;

use std::collections::BTreeMap;

use site_insight_analytics_models::{
    Comparison, Polarity, Ratio, ReviewProvenance, ScoredReview, SentimentReport,
};
use site_insight_geography_models::{ReviewDataset, SentimentLabel};
use site_insight_stats::mean_of;
use thiserror::Error;

pub use issues::{LabeledText, has_recurring_issues, mine_issues, representative_quotes};
pub use scorer::{LexiconScorer, SentimentScorer};
pub use taxonomy::{IssueCategory, IssueTaxonomy};

/// Fewer non-neutral reviews than this makes a summary low-confidence.
pub const LOW_CONFIDENCE_THRESHOLD: usize = 10;

/// Errors that can occur while configuring the miner.
#[derive(Debug, Error)]
pub enum SentimentError {
    /// A taxonomy keyword failed to compile.
    #[error("Invalid keyword in issue category '{category}': {source}")]
    Pattern {
        /// Category the keyword belongs to.
        category: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A taxonomy or lexicon document failed to parse.
    #[error("Invalid definition: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Positive, negative, and neutral counts for a set of reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareSummary {
    /// Positive reviews.
    pub positive: usize,
    /// Negative reviews.
    pub negative: usize,
    /// Neutral reviews.
    pub neutral: usize,
}

impl ShareSummary {
    /// Tallies `labels`.
    #[must_use]
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = SentimentLabel>,
    {
        let mut summary = Self::default();
        for label in labels {
            summary.add(label);
        }
        summary
    }

    /// Counts one more review.
    pub const fn add(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    /// Positive plus negative.
    #[must_use]
    pub const fn non_neutral(&self) -> usize {
        self.positive + self.negative
    }

    /// Positive share of non-neutral reviews.
    #[must_use]
    pub fn positive_share(&self) -> Option<f64> {
        share(self.positive, self.non_neutral())
    }

    /// Negative share of non-neutral reviews.
    #[must_use]
    pub fn negative_share(&self) -> Option<f64> {
        share(self.negative, self.non_neutral())
    }

    /// Positive-to-negative ratio, unbounded without negatives.
    #[must_use]
    pub fn ratio(&self) -> Ratio {
        Ratio::of(self.positive as u64, self.negative as u64)
    }

    /// Whether there are too few non-neutral reviews to trust the shares.
    #[must_use]
    pub const fn low_confidence(&self) -> bool {
        self.non_neutral() < LOW_CONFIDENCE_THRESHOLD
    }
}

#[allow(clippy::cast_precision_loss)]
fn share(part: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64)
}

/// Region-wide sentiment reference: the mean of per-unit shares.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShareBaseline {
    /// Mean positive share over units with non-neutral reviews.
    pub positive_share: Option<f64>,
    /// Mean negative share over units with non-neutral reviews.
    pub negative_share: Option<f64>,
    /// Units that contributed.
    pub units: usize,
}

/// Scores and summarizes reviews with an injected scorer and taxonomy.
#[derive(Debug, Clone)]
pub struct SentimentIssueMiner<S> {
    scorer: S,
    taxonomy: IssueTaxonomy,
}

impl SentimentIssueMiner<LexiconScorer> {
    /// A miner with the built-in lexicon and taxonomy.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded definitions are invalid.
    pub fn embedded() -> Result<Self, SentimentError> {
        Ok(Self::new(LexiconScorer::embedded()?, IssueTaxonomy::embedded()?))
    }
}

impl<S: SentimentScorer> SentimentIssueMiner<S> {
    /// Creates a miner.
    #[must_use]
    pub const fn new(scorer: S, taxonomy: IssueTaxonomy) -> Self {
        Self { scorer, taxonomy }
    }

    /// The taxonomy issues are mined with.
    #[must_use]
    pub const fn taxonomy(&self) -> &IssueTaxonomy {
        &self.taxonomy
    }

    fn label(&self, text: &str) -> (f64, SentimentLabel) {
        let compound = self.scorer.score(text);
        (compound, SentimentLabel::from_compound(compound))
    }

    /// Computes the region-wide baseline over every review in `dataset`.
    ///
    /// Reviews are cleaned and deduplicated per unit, scored, and
    /// summarized per unit. Units without non-neutral reviews are skipped;
    /// the baseline is the mean of the remaining units' shares, not a
    /// pooled share.
    #[must_use]
    pub fn baseline(&self, dataset: &ReviewDataset) -> ShareBaseline {
        let cleaned = dedup::dedup_region(dedup::clean(&dataset.reviews), dataset.columns);

        let mut per_unit: BTreeMap<&str, ShareSummary> = BTreeMap::new();
        for clean in &cleaned {
            let (_, label) = self.label(&clean.review.text);
            per_unit
                .entry(clean.review.unit_id.as_str())
                .or_default()
                .add(label);
        }

        let contributing: Vec<&ShareSummary> =
            per_unit.values().filter(|s| s.non_neutral() > 0).collect();

        let baseline = ShareBaseline {
            positive_share: mean_of(contributing.iter().map(|s| s.positive_share())),
            negative_share: mean_of(contributing.iter().map(|s| s.negative_share())),
            units: contributing.len(),
        };
        log::debug!(
            "Sentiment baseline over {} unit(s) from {} review(s)",
            baseline.units,
            cleaned.len()
        );
        baseline
    }

    /// Builds the sentiment section for `unit_id`.
    ///
    /// A unit without reviews yields a report with zero counts, `None`
    /// shares, and low confidence.
    #[must_use]
    pub fn report(
        &self,
        dataset: &ReviewDataset,
        unit_id: &str,
        baseline: &ShareBaseline,
    ) -> SentimentReport {
        let local: Vec<_> = dataset
            .reviews
            .iter()
            .filter(|r| r.unit_id == unit_id)
            .collect();
        let raw = local.len();

        let cleaned = dedup::clean(local);
        let cleaned_count = cleaned.len();

        let deduped = dedup::dedup_local(cleaned, dataset.columns);

        let scored: Vec<(&str, f64, SentimentLabel)> = deduped
            .iter()
            .map(|c| {
                let (compound, label) = self.label(&c.review.text);
                (c.review.text.as_str(), compound, label)
            })
            .collect();

        let summary = ShareSummary::from_labels(scored.iter().map(|&(_, _, label)| label));

        let labeled: Vec<LabeledText<'_>> = scored
            .iter()
            .map(|&(text, _, label)| LabeledText { text, label })
            .collect();
        let issues = mine_issues(&labeled, &self.taxonomy);
        let quotes = representative_quotes(&labeled, &issues, &self.taxonomy);

        let mut reviews: Vec<ScoredReview> = scored
            .iter()
            .map(|&(text, compound, label)| ScoredReview {
                text: text.to_string(),
                compound,
                label,
            })
            .collect();
        reviews.sort_by(|a, b| b.compound.total_cmp(&a.compound));

        if summary.low_confidence() {
            log::info!(
                "Unit {unit_id}: only {} non-neutral review(s), interpret with caution",
                summary.non_neutral()
            );
        }

        SentimentReport {
            provenance: ReviewProvenance {
                raw,
                cleaned: cleaned_count,
                deduped: deduped.len(),
                non_neutral: summary.non_neutral(),
            },
            positive: summary.positive,
            negative: summary.negative,
            neutral: summary.neutral,
            ratio: summary.ratio(),
            positive_share: Comparison::new(
                summary.positive_share(),
                baseline.positive_share,
                Polarity::HigherIsBetter,
            ),
            negative_share: Comparison::new(
                summary.negative_share(),
                baseline.negative_share,
                Polarity::LowerIsBetter,
            ),
            low_confidence: summary.low_confidence(),
            has_recurring_issues: has_recurring_issues(&issues),
            issues,
            quotes,
            reviews,
        }
    }
}
