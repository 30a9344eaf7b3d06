#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Radius aggregation and competitive-density metrics.
//!
//! Each public function turns the immutable region and facility datasets
//! plus an [`AnalysisRequest`](site_insight_analytics_models::AnalysisRequest)
//! into one typed report section. Zero or missing denominators produce
//! `None`, never infinity or a panic.

pub mod baseline;
pub mod competitors;
pub mod demographics;
pub mod support;

use std::collections::BTreeSet;

use site_insight_geography_models::Facility;
use thiserror::Error;

pub use competitors::competitor_metrics;
pub use demographics::demographics;
pub use support::{SupportKeywordFilter, support_metrics};

/// Errors that can occur while configuring analytics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A keyword pattern failed to compile.
    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A filter definition failed to parse.
    #[error("Invalid filter definition: {0}")]
    Toml(#[from] toml::de::Error),
}

/// `numerator / denominator`, or `None` when either side is missing or
/// the denominator is not positive.
#[must_use]
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Rate per 1,000 residents, or `None` without a positive population.
#[must_use]
pub fn per_thousand(count: f64, population: Option<f64>) -> Option<f64> {
    ratio(Some(count), population).map(|r| r * 1000.0)
}

/// Keeps the first of each group of facilities sharing a name and
/// address, preserving order.
pub fn dedup_by_name_address<T>(items: Vec<T>, facility: impl Fn(&T) -> &Facility) -> Vec<T> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| {
            let f = facility(item);
            seen.insert((f.name.clone(), f.address.clone()))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::facility;
    use super::*;

    #[test]
    fn ratio_guards_zero_and_missing_denominators() {
        assert_eq!(ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(ratio(Some(10.0), Some(-1.0)), None);
        assert_eq!(ratio(Some(10.0), None), None);
        assert_eq!(ratio(None, Some(3.0)), None);
    }

    #[test]
    fn per_thousand_scales() {
        assert_eq!(per_thousand(2.0, Some(4000.0)), Some(0.5));
        assert_eq!(per_thousand(2.0, Some(0.0)), None);
        assert_eq!(per_thousand(0.0, Some(1000.0)), Some(0.0));
    }

    #[test]
    fn dedup_keeps_first_and_is_idempotent() {
        let mut dup = facility("a", 0.0, 0.0, "u");
        dup.latitude = 9.0;
        let items = vec![
            facility("a", 0.0, 0.0, "u"),
            facility("b", 0.0, 0.0, "u"),
            dup,
        ];
        let once = dedup_by_name_address(items, |f| f);
        assert_eq!(once.len(), 2);
        assert!(once[0].latitude.abs() < f64::EPSILON);

        let twice = dedup_by_name_address(once.clone(), |f| f);
        assert_eq!(once, twice);
    }
}
