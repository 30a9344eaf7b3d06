//! Competitor density around a site and across the region.

use std::collections::{BTreeMap, BTreeSet};

use site_insight_analytics_models::{AnalysisRequest, Comparison, CompetitorReport, Polarity};
use site_insight_geography_models::{Facility, Field, NearbyFacility};
use site_insight_spatial::facilities_within;
use site_insight_stats::{RegionStatsStore, mean_of, sum_of};

use crate::{baseline, dedup_by_name_address, per_thousand, ratio};

/// Per-unit competitor totals used for region baselines.
#[derive(Debug, Default)]
struct UnitTally {
    count: usize,
    reviews: f64,
    ratings: Vec<f64>,
}

impl UnitTally {
    #[allow(clippy::cast_precision_loss)]
    const fn count_f64(&self) -> f64 {
        self.count as f64
    }
}

/// Selects competitors around the request point and compares their
/// density with every unit in the region.
///
/// Selection applies the radius, then the optional name and address
/// dedup, then the optional minimum rating. The selected population is
/// the population of the distinct units that own the selected
/// competitors, so an empty selection has no population and every rate
/// is `None`.
#[must_use]
pub fn competitor_metrics(
    store: &RegionStatsStore,
    competitors: &[Facility],
    request: &AnalysisRequest,
) -> CompetitorReport {
    let selected = select(competitors, request);

    let owning_units: BTreeSet<&str> = selected
        .iter()
        .filter_map(|n| n.facility.unit_id.as_deref())
        .collect();
    let population = sum_of(owning_units.iter().filter_map(|id| {
        store
            .get_unit_row(id)
            .map(|u| u.attribute(Field::Population2021))
            .map_err(|e| log::debug!("Competitor unit not in region data: {e}"))
            .ok()
    }));

    #[allow(clippy::cast_precision_loss)]
    let count = selected.len() as f64;
    let total_reviews: f64 = selected
        .iter()
        .filter_map(|n| n.facility.review_count)
        .sum();

    let tallies = tally_by_unit(competitors);
    let method = request.baseline_method;

    let unit_rates = |rate: fn(&UnitTally, Option<f64>) -> Option<f64>| {
        baseline::reduce(
            method,
            store.units().iter().map(|u| {
                let tally = tallies.get(u.id.as_str());
                let empty = UnitTally::default();
                rate(tally.unwrap_or(&empty), u.attribute(Field::Population2021))
            }),
        )
    };

    let population_per_facility = Comparison::new(
        ratio(population, Some(count)),
        unit_rates(|t, pop| ratio(pop, Some(t.count_f64()))),
        Polarity::HigherIsBetter,
    );

    let facilities_per_1000 = Comparison::new(
        per_thousand(count, population),
        unit_rates(|t, pop| per_thousand(t.count_f64(), pop)),
        Polarity::HigherIsBetter,
    );

    let reviews_per_1000 = Comparison::new(
        per_thousand(total_reviews, population),
        unit_rates(|t, pop| per_thousand(t.reviews, pop)),
        Polarity::HigherIsBetter,
    );

    let average_rating = Comparison::new(
        mean_of(selected.iter().map(|n| n.facility.rating)),
        region_rating_baseline(store, &tallies),
        Polarity::HigherIsBetter,
    );

    log::debug!(
        "{} competitor(s) within {:.1} km across {} unit(s)",
        selected.len(),
        request.radius_km,
        owning_units.len()
    );

    CompetitorReport {
        facilities: selected,
        population,
        total_reviews,
        population_per_facility,
        facilities_per_1000,
        average_rating,
        reviews_per_1000,
    }
}

/// Applies the radius, dedup, and minimum rating filters in order.
#[must_use]
pub fn select(competitors: &[Facility], request: &AnalysisRequest) -> Vec<NearbyFacility> {
    let mut nearby = facilities_within(
        competitors,
        request.latitude,
        request.longitude,
        request.radius_km,
    );

    if request.dedup_facilities {
        nearby = dedup_by_name_address(nearby, |n| &n.facility);
    }

    if let Some(min) = request.min_competitor_rating {
        nearby.retain(|n| n.facility.rating.is_some_and(|r| r >= min));
    }

    nearby
}

/// Groups every competitor by its owning unit. Competitors without a unit
/// are not counted.
fn tally_by_unit(competitors: &[Facility]) -> BTreeMap<&str, UnitTally> {
    let mut tallies: BTreeMap<&str, UnitTally> = BTreeMap::new();
    for facility in competitors {
        let Some(unit_id) = facility.unit_id.as_deref() else {
            continue;
        };
        let tally = tallies.entry(unit_id).or_default();
        tally.count += 1;
        tally.reviews += facility.review_count.unwrap_or(0.0);
        if let Some(rating) = facility.rating {
            tally.ratings.push(rating);
        }
    }
    tallies
}

/// Mean of the per-unit mean ratings, over region units with a positive
/// mean.
fn region_rating_baseline(
    store: &RegionStatsStore,
    tallies: &BTreeMap<&str, UnitTally>,
) -> Option<f64> {
    mean_of(
        store
            .units()
            .iter()
            .filter_map(|u| tallies.get(u.id.as_str()))
            .map(|t| mean_of(t.ratings.iter().copied().map(Some)))
            .filter(|m| m.is_some_and(|r| r > 0.0)),
    )
}

#[cfg(test)]
mod tests {
    use site_insight_analytics_models::BaselineMethod;

    use super::*;
    use crate::test_support::{facility, unit};

    fn store() -> RegionStatsStore {
        RegionStatsStore::from_units(vec![
            unit("A", 0.0, 1.0, Some(2000.0)),
            unit("B", 1.0, 2.0, Some(4000.0)),
            unit("C", 2.0, 3.0, Some(1000.0)),
        ])
    }

    fn rated(name: &str, lat: f64, lon: f64, unit_id: &str, rating: f64, reviews: f64) -> Facility {
        let mut f = facility(name, lat, lon, unit_id);
        f.rating = Some(rating);
        f.review_count = Some(reviews);
        f
    }

    fn competitors() -> Vec<Facility> {
        vec![
            rated("one", 0.5, 0.50, "A", 4.0, 10.0),
            rated("two", 0.5, 0.51, "A", 5.0, 30.0),
            rated("three", 0.5, 1.50, "B", 3.0, 100.0),
        ]
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn selected_metrics_use_owning_unit_population() {
        let request = AnalysisRequest::new(0.5, 0.5).with_radius_km(2.0);
        let report = competitor_metrics(&store(), &competitors(), &request);

        assert_eq!(report.facilities.len(), 2);
        assert_eq!(report.population, Some(2000.0));
        assert!((report.total_reviews - 40.0).abs() < 1e-9);
        assert_eq!(report.population_per_facility.selected, Some(1000.0));
        approx(report.facilities_per_1000.selected, 1.0);
        approx(report.reviews_per_1000.selected, 20.0);
        assert_eq!(report.average_rating.selected, Some(4.5));
    }

    #[test]
    fn zero_competitors_report_missing_rates() {
        let request = AnalysisRequest::new(0.5, 2.5).with_radius_km(1.0);
        let report = competitor_metrics(&store(), &competitors(), &request);

        assert!(report.facilities.is_empty());
        assert_eq!(report.population, None);
        assert_eq!(report.population_per_facility.selected, None);
        assert_eq!(report.facilities_per_1000.selected, None);
        assert_eq!(report.reviews_per_1000.selected, None);
        assert_eq!(report.average_rating.selected, None);
        assert_eq!(report.facilities_per_1000.direction, None);
    }

    #[test]
    fn region_baselines_include_units_without_competitors() {
        let request = AnalysisRequest::new(0.5, 0.5).with_baseline_method(BaselineMethod::Mean);
        let report = competitor_metrics(&store(), &competitors(), &request);

        // Per 1000: A = 1.0, B = 0.25, C = 0.0.
        approx(report.facilities_per_1000.baseline, 1.25 / 3.0);

        // Per facility: A = 1000, B = 4000; C has no competitors.
        assert_eq!(report.population_per_facility.baseline, Some(2500.0));

        // Unit mean ratings: A = 4.5, B = 3.0.
        assert_eq!(report.average_rating.baseline, Some(3.75));
    }

    #[test]
    fn median_baseline() {
        let request = AnalysisRequest::new(0.5, 0.5);
        let report = competitor_metrics(&store(), &competitors(), &request);
        // Reviews per 1000: A = 20, B = 25, C = 0.
        approx(report.reviews_per_1000.baseline, 20.0);
    }

    #[test]
    fn dedup_and_rating_filter_apply_in_order() {
        let mut list = competitors();
        list.push(rated("one", 0.5, 0.505, "A", 1.0, 0.0));

        let mut request = AnalysisRequest::new(0.5, 0.5);
        assert_eq!(select(&list, &request).len(), 2);

        request.dedup_facilities = false;
        assert_eq!(select(&list, &request).len(), 3);

        request.min_competitor_rating = Some(4.5);
        let kept = select(&list, &request);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].facility.name, "two");
    }

    #[test]
    fn unrated_competitors_drop_under_minimum() {
        let list = vec![facility("plain", 0.5, 0.5, "A")];
        let mut request = AnalysisRequest::new(0.5, 0.5);
        assert_eq!(select(&list, &request).len(), 1);
        request.min_competitor_rating = Some(1.0);
        assert!(select(&list, &request).is_empty());
    }
}
