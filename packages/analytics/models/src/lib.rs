#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis request and report types.
//!
//! Defines the single request object a site analysis takes and the
//! structured, serializable sections it produces. Missing values are
//! `None` throughout and render as `"N/A"`.

use std::collections::BTreeMap;

use site_insight_geography_models::{Field, NearbyFacility, SentimentLabel};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Default analysis radius in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 2.0;

/// Recommended radius bounds in kilometres. Values outside are accepted.
pub const RECOMMENDED_RADIUS_KM: (f64, f64) = (0.5, 10.0);

/// How region-wide baselines reduce per-unit values.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BaselineMethod {
    /// Arithmetic mean across units.
    Mean,
    /// Median across units.
    #[default]
    Median,
}

/// A single coordinate-in, report-out analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Query latitude (WGS84 degrees).
    pub latitude: f64,
    /// Query longitude (WGS84 degrees).
    pub longitude: f64,
    /// Radius for aggregation and facility search, in kilometres.
    pub radius_km: f64,
    /// Reduction used for region-wide facility baselines.
    pub baseline_method: BaselineMethod,
    /// Drop facilities sharing a name and address.
    pub dedup_facilities: bool,
    /// Restrict support facilities to keyword-matched hospitals and
    /// walk-in clinics.
    pub support_keyword_filter: bool,
    /// Drop competitors rated below this value (or unrated).
    pub min_competitor_rating: Option<f64>,
}

impl AnalysisRequest {
    /// Creates a request for a coordinate with default parameters.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km: DEFAULT_RADIUS_KM,
            baseline_method: BaselineMethod::Median,
            dedup_facilities: true,
            support_keyword_filter: false,
            min_competitor_rating: None,
        }
    }

    /// Sets the radius.
    #[must_use]
    pub const fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    /// Sets the baseline method.
    #[must_use]
    pub const fn with_baseline_method(mut self, method: BaselineMethod) -> Self {
        self.baseline_method = method;
        self
    }
}

/// Whether a larger value of a metric is good for the candidate site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// A positive delta is favorable.
    HigherIsBetter,
    /// A negative delta is favorable.
    LowerIsBetter,
}

/// Direction of a selected-vs-baseline delta, from the site's point of
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// The selected area compares well.
    Favorable,
    /// The selected area compares poorly.
    Unfavorable,
    /// No difference.
    Unchanged,
}

/// A selected-area value against its region-wide baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// Value for the selected area.
    pub selected: Option<f64>,
    /// Region-wide reference value.
    pub baseline: Option<f64>,
    /// `selected - baseline`, when both are present.
    pub delta: Option<f64>,
    /// Direction of `delta` under the metric's polarity.
    pub direction: Option<Direction>,
}

impl Comparison {
    /// Compares `selected` against `baseline`.
    #[must_use]
    pub fn new(selected: Option<f64>, baseline: Option<f64>, polarity: Polarity) -> Self {
        let delta = match (selected, baseline) {
            (Some(s), Some(b)) => Some(s - b).filter(|d| d.is_finite()),
            _ => None,
        };

        let direction = delta.map(|d| {
            let signed = match polarity {
                Polarity::HigherIsBetter => d,
                Polarity::LowerIsBetter => -d,
            };
            if signed > 0.0 {
                Direction::Favorable
            } else if signed < 0.0 {
                Direction::Unfavorable
            } else {
                Direction::Unchanged
            }
        });

        Self {
            selected,
            baseline,
            delta,
            direction,
        }
    }
}

/// A ratio whose denominator may legitimately be zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Ratio {
    /// Finite quotient.
    Finite(f64),
    /// Zero denominator: no comparable counterpart exists.
    Unbounded,
}

impl Ratio {
    /// `numerator / denominator`, or [`Ratio::Unbounded`] when the
    /// denominator is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Self::Unbounded
        } else {
            Self::Finite(numerator as f64 / denominator as f64)
        }
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{v:.2}"),
            Self::Unbounded => write!(f, "\u{221e}"),
        }
    }
}

/// Formats a possibly-missing value with `precision` decimals, or `"N/A"`.
#[must_use]
pub fn format_optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.precision$}"))
}

/// Population and income aggregates around the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsReport {
    /// Identifiers of the units intersecting the radius, in load order.
    pub unit_ids_in_radius: Vec<String>,
    /// Reduction used for the non-population baselines.
    pub baseline_method: BaselineMethod,
    /// Median income (2020), averaged over units in radius.
    pub median_income: Comparison,
    /// Average income (2020), averaged over units in radius.
    pub average_income: Comparison,
    /// Population density, averaged over units in radius.
    pub density: Comparison,
    /// Population growth 2016-2021 (%), averaged over units in radius.
    pub growth: Comparison,
    /// Total population in radius against the region mean per unit scaled
    /// by the number of units in radius.
    pub population: Comparison,
    /// Share of each age band in the total, in radius vs region.
    pub age_bands: Vec<AgeBandShare>,
}

/// Share of an age band in the population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBandShare {
    /// Age band field.
    pub band: Field,
    /// Band total over age total, as a fraction.
    pub share: Comparison,
}

/// Competing facilities around the site and their density metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorReport {
    /// Competitors retained after radius, dedup, and rating filters.
    pub facilities: Vec<NearbyFacility>,
    /// Population of the units owning the retained competitors.
    pub population: Option<f64>,
    /// Sum of review counts of the retained competitors.
    pub total_reviews: f64,
    /// Residents per competitor.
    pub population_per_facility: Comparison,
    /// Competitors per 1,000 residents.
    pub facilities_per_1000: Comparison,
    /// Mean competitor rating.
    pub average_rating: Comparison,
    /// Competitor reviews per 1,000 residents.
    pub reviews_per_1000: Comparison,
}

/// Complementary support facilities around the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportReport {
    /// Support facilities within radius, nearest first.
    pub facilities: Vec<NearbyFacility>,
    /// Support rows before dedup and filtering.
    pub rows_total: usize,
    /// Support rows after dedup and filtering.
    pub rows_after_filter: usize,
    /// Whether the keyword filter was applied.
    pub keyword_filter_applied: bool,
    /// Competitors within the same radius (unfiltered).
    pub competitor_count: usize,
    /// Support facilities in radius against the per-unit baseline.
    pub support_count: Comparison,
    /// Support facilities per competitor; undefined without competitors.
    pub support_per_competitor: Comparison,
    /// Distance to the nearest support facility.
    pub nearest_support_km: Option<f64>,
    /// Sum of `1 / (1 + d)` over support facilities in radius.
    pub distance_weighted_index: f64,
}

/// Review counts through each pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewProvenance {
    /// Reviews attributed to the unit.
    pub raw: usize,
    /// After dropping empty texts.
    pub cleaned: usize,
    /// After deduplication.
    pub deduped: usize,
    /// Positive plus negative.
    pub non_neutral: usize,
}

/// One scored review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredReview {
    /// Original review text.
    pub text: String,
    /// Compound score in [-1, 1].
    pub compound: f64,
    /// Thresholded label.
    pub label: SentimentLabel,
}

/// Mention counts for one issue category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    /// Category name.
    pub issue: String,
    /// Negative reviews mentioning the category.
    pub negative_mentions: usize,
    /// `negative_mentions` as a percentage of all negative reviews.
    pub share_of_negatives: f64,
    /// Reviews of any sentiment mentioning the category.
    pub all_mentions: usize,
    /// Most frequent two-word phrase among matching negative reviews.
    pub example_phrase: Option<String>,
}

/// Representative negative excerpts for one issue category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueQuotes {
    /// Category name.
    pub issue: String,
    /// Up to three shortest matching negative texts.
    pub quotes: Vec<String>,
}

/// Review sentiment and recurring complaints for the site's unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentReport {
    /// Review counts through the pipeline.
    pub provenance: ReviewProvenance,
    /// Positive reviews.
    pub positive: usize,
    /// Negative reviews.
    pub negative: usize,
    /// Neutral reviews.
    pub neutral: usize,
    /// Positive-to-negative ratio.
    pub ratio: Ratio,
    /// Positive share of non-neutral reviews vs the mean per-unit share.
    pub positive_share: Comparison,
    /// Negative share of non-neutral reviews vs the mean per-unit share.
    pub negative_share: Comparison,
    /// Fewer than ten non-neutral reviews.
    pub low_confidence: bool,
    /// Issue categories, most negative mentions first.
    pub issues: Vec<IssueSummary>,
    /// Whether any category was mentioned at all.
    pub has_recurring_issues: bool,
    /// Quotes for the top categories.
    pub quotes: Vec<IssueQuotes>,
    /// Every deduplicated review, highest compound first.
    pub reviews: Vec<ScoredReview>,
}

/// The full analysis for one coordinate.
///
/// Sections are `None` when the dataset they depend on is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    /// Unit containing the query coordinate.
    pub unit_id: String,
    /// That unit's own attribute row, as loaded.
    pub selected_unit: BTreeMap<Field, Option<f64>>,
    /// The request that produced this report.
    pub request: AnalysisRequest,
    /// Demographic aggregates.
    pub demographics: Option<DemographicsReport>,
    /// Competitor density metrics.
    pub competitors: Option<CompetitorReport>,
    /// Support facility metrics.
    pub support: Option<SupportReport>,
    /// Review sentiment and issues.
    pub sentiment: Option<SentimentReport>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn comparison_direction_follows_polarity() {
        let up = Comparison::new(Some(5.0), Some(3.0), Polarity::HigherIsBetter);
        assert_eq!(up.delta, Some(2.0));
        assert_eq!(up.direction, Some(Direction::Favorable));

        let flipped = Comparison::new(Some(5.0), Some(3.0), Polarity::LowerIsBetter);
        assert_eq!(flipped.direction, Some(Direction::Unfavorable));

        let down = Comparison::new(Some(1.0), Some(3.0), Polarity::LowerIsBetter);
        assert_eq!(down.direction, Some(Direction::Favorable));

        let same = Comparison::new(Some(3.0), Some(3.0), Polarity::HigherIsBetter);
        assert_eq!(same.direction, Some(Direction::Unchanged));
    }

    #[test]
    fn comparison_with_missing_side_has_no_delta() {
        let c = Comparison::new(None, Some(3.0), Polarity::HigherIsBetter);
        assert_eq!(c.delta, None);
        assert_eq!(c.direction, None);
        assert_eq!(c.baseline, Some(3.0));
    }

    #[test]
    fn ratio_with_zero_denominator_is_unbounded() {
        assert_eq!(Ratio::of(3, 0), Ratio::Unbounded);
        assert_eq!(Ratio::of(0, 0), Ratio::Unbounded);
        assert_eq!(Ratio::of(2, 2), Ratio::Finite(1.0));
        assert_eq!(Ratio::Unbounded.to_string(), "\u{221e}");
        assert_eq!(Ratio::Finite(1.5).to_string(), "1.50");
    }

    #[test]
    fn ratio_serializes_with_kind_tag() {
        let json = serde_json::to_value(Ratio::Unbounded).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "unbounded" }));
        let json = serde_json::to_value(Ratio::Finite(0.5)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "finite", "value": 0.5 }));
    }

    #[test]
    fn missing_values_format_as_na() {
        assert_eq!(format_optional(None, 2), "N/A");
        assert_eq!(format_optional(Some(1.234_56), 2), "1.23");
    }

    #[test]
    fn baseline_method_parses_case_insensitively() {
        assert_eq!(BaselineMethod::from_str("MEAN").unwrap(), BaselineMethod::Mean);
        assert_eq!(BaselineMethod::from_str("median").unwrap(), BaselineMethod::Median);
        assert!(BaselineMethod::from_str("mode").is_err());
        assert_eq!(BaselineMethod::default(), BaselineMethod::Median);
    }

    #[test]
    fn request_defaults() {
        let req = AnalysisRequest::new(43.65, -79.38);
        assert!((req.radius_km - DEFAULT_RADIUS_KM).abs() < f64::EPSILON);
        assert!(req.dedup_facilities);
        assert!(!req.support_keyword_filter);
        assert_eq!(req.min_competitor_rating, None);
    }
}
