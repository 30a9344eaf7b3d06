//! Population and income aggregates within a radius.

use site_insight_analytics_models::{
    AgeBandShare, AnalysisRequest, Comparison, DemographicsReport, Polarity,
};
use site_insight_geography_models::{Field, GeoUnit};
use site_insight_spatial::buffer_km;
use site_insight_stats::{RegionStatsStore, mean, sum};

use crate::{baseline, ratio};

/// Fields averaged over the units in radius.
const AVERAGED_FIELDS: [Field; 4] = [
    Field::MedianIncome2020,
    Field::AverageIncome2020,
    Field::Density,
    Field::Growth,
];

/// Age bands reported as a share of the age total.
const AGE_BANDS: [Field; 4] = [
    Field::Age0To14,
    Field::Age15To64,
    Field::Age65Plus,
    Field::Age85Plus,
];

/// Aggregates region attributes over every unit intersecting the
/// request's radius and compares them with region-wide baselines.
///
/// Averaged fields use the request's baseline method over all units.
/// Population is a sum, so its baseline is the region mean per unit
/// multiplied by the number of units in radius.
#[must_use]
pub fn demographics(store: &RegionStatsStore, request: &AnalysisRequest) -> DemographicsReport {
    let area = buffer_km(request.latitude, request.longitude, request.radius_km);
    let in_radius = store.intersecting(&area);
    let all = store.all();

    log::debug!(
        "{} unit(s) intersect {:.1} km around ({}, {})",
        in_radius.len(),
        request.radius_km,
        request.latitude,
        request.longitude
    );

    let averaged = |field: Field| {
        Comparison::new(
            mean(field, &in_radius),
            baseline::reduce(
                request.baseline_method,
                all.iter().map(|u| u.attribute(field)),
            ),
            Polarity::HigherIsBetter,
        )
    };
    let [median_income, average_income, density, growth] = AVERAGED_FIELDS.map(averaged);

    let population = Comparison::new(
        sum(Field::Population2021, &in_radius),
        scaled_population_baseline(&all, in_radius.len()),
        Polarity::HigherIsBetter,
    );

    let age_bands = AGE_BANDS
        .iter()
        .map(|&band| AgeBandShare {
            band,
            share: Comparison::new(
                band_share(band, &in_radius),
                band_share(band, &all),
                Polarity::HigherIsBetter,
            ),
        })
        .collect();

    DemographicsReport {
        unit_ids_in_radius: in_radius.iter().map(|u| u.id.clone()).collect(),
        baseline_method: request.baseline_method,
        median_income,
        average_income,
        density,
        growth,
        population,
        age_bands,
    }
}

/// Expected population for `units_in_radius` average units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scaled_population_baseline(all: &[&GeoUnit], units_in_radius: usize) -> Option<f64> {
    mean(Field::Population2021, all).map(|per_unit| per_unit * units_in_radius as f64)
}

/// Pooled share of `band` in the age total over `units`.
fn band_share(band: Field, units: &[&GeoUnit]) -> Option<f64> {
    ratio(sum(band, units), sum(Field::AgeTotal, units))
}
