//! Complementary support facilities (hospitals, walk-in clinics) around
//! a site.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;
use site_insight_analytics_models::{AnalysisRequest, Comparison, Polarity, SupportReport};
use site_insight_geography_models::Facility;
use site_insight_spatial::{distance_weighted_index, facilities_within};

use crate::{AnalyticsError, baseline, dedup_by_name_address, ratio};

/// Embedded default keyword rules.
const DEFAULT_FILTER_TOML: &str = include_str!("../config/support_filter.toml");

/// Keyword rules as written in TOML.
#[derive(Debug, Deserialize)]
struct FilterDefinition {
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    allowlist: Vec<String>,
}

/// Keeps facilities whose name, address, or tags look like a hospital or
/// walk-in clinic.
///
/// A facility passes when an include pattern matches or an allowlisted
/// substring is present, and no exclude pattern matches.
#[derive(Debug, Clone)]
pub struct SupportKeywordFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
    allowlist: Vec<String>,
}

impl SupportKeywordFilter {
    /// Builds a filter from pattern lists.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Pattern`] if a pattern is not a valid
    /// regular expression.
    pub fn new<S: AsRef<str>>(
        include: &[S],
        exclude: &[S],
        allowlist: &[S],
    ) -> Result<Self, AnalyticsError> {
        Ok(Self {
            include: alternation(include)?,
            exclude: alternation(exclude)?,
            allowlist: allowlist
                .iter()
                .map(|a| a.as_ref().to_lowercase())
                .collect(),
        })
    }

    /// Parses a filter from a TOML document with `include`, `exclude`,
    /// and `allowlist` arrays.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Toml`] if the document is malformed, or
    /// [`AnalyticsError::Pattern`] if a pattern does not compile.
    pub fn from_toml(toml_str: &str) -> Result<Self, AnalyticsError> {
        let def: FilterDefinition = toml::de::from_str(toml_str)?;
        Self::new(&def.include, &def.exclude, &def.allowlist)
    }

    /// The built-in hospital and walk-in clinic rules.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded rules are invalid.
    pub fn embedded() -> Result<Self, AnalyticsError> {
        Self::from_toml(DEFAULT_FILTER_TOML)
    }

    /// Whether `facility` passes the filter.
    #[must_use]
    pub fn matches(&self, facility: &Facility) -> bool {
        let blob = format!(
            "{} {} {}",
            facility.name,
            facility.address,
            facility.tags.join(" ")
        )
        .to_lowercase();

        let included = self.include.as_ref().is_some_and(|re| re.is_match(&blob))
            || self.allowlist.iter().any(|a| blob.contains(a.as_str()));
        let excluded = self.exclude.as_ref().is_some_and(|re| re.is_match(&blob));

        included && !excluded
    }
}

/// Compiles patterns into one case-insensitive alternation, or `None`
/// when there are none.
fn alternation<S: AsRef<str>>(patterns: &[S]) -> Result<Option<Regex>, AnalyticsError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let joined = patterns
        .iter()
        .map(|p| format!("(?:{})", p.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&format!("(?i){joined}"))?))
}

/// Support facility access around the request point.
///
/// Support facilities are deduplicated by name and address when the
/// request asks for it and keyword-filtered when the request enables the
/// filter. Competitors are counted within the same radius without any
/// filtering. Region baselines reduce per-unit counts over every unit
/// that owns either kind of facility.
#[must_use]
pub fn support_metrics(
    support: &[Facility],
    competitors: &[Facility],
    request: &AnalysisRequest,
    filter: &SupportKeywordFilter,
) -> SupportReport {
    let rows_total = support.len();

    let mut candidates: Vec<Facility> = support.to_vec();
    if request.dedup_facilities {
        candidates = dedup_by_name_address(candidates, |f| f);
    }
    if request.support_keyword_filter {
        candidates.retain(|f| filter.matches(f));
    }
    let rows_after_filter = candidates.len();

    let mut nearby = facilities_within(
        &candidates,
        request.latitude,
        request.longitude,
        request.radius_km,
    );
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let competitor_count = facilities_within(
        competitors,
        request.latitude,
        request.longitude,
        request.radius_km,
    )
    .len();

    log::debug!(
        "Support rows: {rows_total} -> after dedup/filter: {rows_after_filter} -> within {} km: {}",
        request.radius_km,
        nearby.len()
    );

    let counts = counts_by_unit(&candidates, competitors);
    let method = request.baseline_method;

    #[allow(clippy::cast_precision_loss)]
    let support_count = Comparison::new(
        Some(nearby.len() as f64),
        baseline::reduce(method, counts.values().map(|&(s, _)| Some(s))),
        Polarity::HigherIsBetter,
    );

    #[allow(clippy::cast_precision_loss)]
    let support_per_competitor = Comparison::new(
        ratio(Some(nearby.len() as f64), Some(competitor_count as f64)),
        baseline::reduce(method, counts.values().map(|&(s, c)| ratio(Some(s), Some(c)))),
        Polarity::HigherIsBetter,
    );

    let nearest_support_km = nearby.first().map(|n| n.distance_km);
    let distance_weighted_index = distance_weighted_index(nearby.iter().map(|n| n.distance_km));

    SupportReport {
        facilities: nearby,
        rows_total,
        rows_after_filter,
        keyword_filter_applied: request.support_keyword_filter,
        competitor_count,
        support_count,
        support_per_competitor,
        nearest_support_km,
        distance_weighted_index,
    }
}

/// `(support, competitor)` counts per unit over the union of units owning
/// either kind.
fn counts_by_unit<'a>(
    support: &'a [Facility],
    competitors: &'a [Facility],
) -> BTreeMap<&'a str, (f64, f64)> {
    let mut counts: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for unit_id in support.iter().filter_map(|f| f.unit_id.as_deref()) {
        counts.entry(unit_id).or_default().0 += 1.0;
    }
    for unit_id in competitors.iter().filter_map(|f| f.unit_id.as_deref()) {
        counts.entry(unit_id).or_default().1 += 1.0;
    }
    counts
}

#[cfg(test)]
mod tests {
    use site_insight_analytics_models::BaselineMethod;

    use super::*;
    use crate::test_support::facility;

    fn tagged(name: &str, lat: f64, lon: f64, unit_id: &str, tags: &[&str]) -> Facility {
        let mut f = facility(name, lat, lon, unit_id);
        f.tags = tags.iter().map(ToString::to_string).collect();
        f
    }

    #[test]
    fn embedded_filter_keeps_hospitals_and_walk_ins() {
        let filter = SupportKeywordFilter::embedded().unwrap();

        assert!(filter.matches(&facility("General Hospital", 0.0, 0.0, "A")));
        assert!(filter.matches(&facility("Main St Walk-In Clinic", 0.0, 0.0, "A")));
        assert!(filter.matches(&facility("Appletree Medical", 0.0, 0.0, "A")));
        assert!(filter.matches(&tagged("Dr. Lee", 0.0, 0.0, "A", &["doctor", "health"])));

        assert!(!filter.matches(&facility("Downtown Chiropractic Hospital", 0.0, 0.0, "A")));
        assert!(!filter.matches(&facility("Day Spa", 0.0, 0.0, "A")));
        assert!(!filter.matches(&facility("Corner Pharmacy", 0.0, 0.0, "A")));
    }

    #[test]
    fn custom_filter_from_toml() {
        let filter = SupportKeywordFilter::from_toml(
            r#"
            include = ['pharmacy']
            allowlist = ['Rexall']
            "#,
        )
        .unwrap();
        assert!(filter.matches(&facility("Corner Pharmacy", 0.0, 0.0, "A")));
        assert!(filter.matches(&facility("rexall 42", 0.0, 0.0, "A")));
        assert!(!filter.matches(&facility("General Hospital", 0.0, 0.0, "A")));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(matches!(
            SupportKeywordFilter::new(&["("], &[], &[]),
            Err(AnalyticsError::Pattern(_))
        ));
        assert!(matches!(
            SupportKeywordFilter::from_toml("include = 3"),
            Err(AnalyticsError::Toml(_))
        ));
    }

    #[test]
    fn metrics_are_nearest_first() {
        let support = vec![
            facility("Far Hospital", 0.5, 0.51, "A"),
            facility("Near Hospital", 0.5, 0.501, "A"),
            facility("Other Hospital", 0.5, 1.5, "B"),
        ];
        let competitors = vec![
            facility("clinic one", 0.5, 0.5, "A"),
            facility("clinic two", 0.5, 0.502, "A"),
        ];
        let request = AnalysisRequest::new(0.5, 0.5).with_baseline_method(BaselineMethod::Mean);
        let filter = SupportKeywordFilter::embedded().unwrap();
        let report = support_metrics(&support, &competitors, &request, &filter);

        let names: Vec<&str> = report
            .facilities
            .iter()
            .map(|n| n.facility.name.as_str())
            .collect();
        assert_eq!(names, vec!["Near Hospital", "Far Hospital"]);
        assert_eq!(report.competitor_count, 2);
        assert_eq!(report.support_count.selected, Some(2.0));
        assert_eq!(report.support_per_competitor.selected, Some(1.0));

        let nearest = report.nearest_support_km.unwrap();
        assert!((nearest - report.facilities[0].distance_km).abs() < f64::EPSILON);
        assert!(report.distance_weighted_index > 1.0);
        assert!(report.distance_weighted_index < 2.0);

        // A owns two of each, B owns one support and no competitors.
        assert_eq!(report.support_count.baseline, Some(1.5));
        assert_eq!(report.support_per_competitor.baseline, Some(1.0));
    }

    #[test]
    fn no_competitors_leaves_ratio_undefined() {
        let support = vec![facility("Near Hospital", 0.5, 0.501, "A")];
        let request = AnalysisRequest::new(0.5, 0.5);
        let filter = SupportKeywordFilter::embedded().unwrap();
        let report = support_metrics(&support, &[], &request, &filter);

        assert_eq!(report.competitor_count, 0);
        assert_eq!(report.support_per_competitor.selected, None);
        assert_eq!(report.support_per_competitor.baseline, None);
    }

    #[test]
    fn no_support_in_radius() {
        let support = vec![facility("Far Hospital", 0.5, 2.5, "C")];
        let request = AnalysisRequest::new(0.5, 0.5);
        let filter = SupportKeywordFilter::embedded().unwrap();
        let report = support_metrics(&support, &[], &request, &filter);

        assert!(report.facilities.is_empty());
        assert_eq!(report.nearest_support_km, None);
        assert!(report.distance_weighted_index.abs() < f64::EPSILON);
        assert_eq!(report.support_count.selected, Some(0.0));
    }

    #[test]
    fn dedup_and_filter_change_row_counts() {
        let support = vec![
            facility("General Hospital", 0.5, 0.5, "A"),
            facility("General Hospital", 0.5, 0.5, "A"),
            facility("Day Spa", 0.5, 0.5, "A"),
        ];
        let filter = SupportKeywordFilter::embedded().unwrap();

        let mut request = AnalysisRequest::new(0.5, 0.5);
        let report = support_metrics(&support, &[], &request, &filter);
        assert_eq!(report.rows_total, 3);
        assert_eq!(report.rows_after_filter, 2);
        assert!(!report.keyword_filter_applied);

        request.support_keyword_filter = true;
        let report = support_metrics(&support, &[], &request, &filter);
        assert_eq!(report.rows_after_filter, 1);
        assert!(report.keyword_filter_applied);
    }
}
