//! Geodesic radius filtering for point facilities.

use geo::{Distance as _, Geodesic, Point};
use site_insight_geography_models::{Facility, NearbyFacility};

/// Geodesic distance between two WGS84 coordinates, in kilometres.
#[must_use]
pub fn geodesic_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    Geodesic.distance(Point::new(lon_a, lat_a), Point::new(lon_b, lat_b)) / 1000.0
}

/// Returns the facilities within `radius_km` of `(lat, lon)`, in input
/// order, each annotated with its distance.
///
/// The boundary is inclusive. Facilities with non-finite coordinates are
/// skipped.
#[must_use]
pub fn facilities_within(
    facilities: &[Facility],
    lat: f64,
    lon: f64,
    radius_km: f64,
) -> Vec<NearbyFacility> {
    facilities
        .iter()
        .filter(|f| f.latitude.is_finite() && f.longitude.is_finite())
        .filter_map(|f| {
            let distance_km = geodesic_km(lat, lon, f.latitude, f.longitude);
            (distance_km <= radius_km).then(|| NearbyFacility {
                facility: f.clone(),
                distance_km,
            })
        })
        .collect()
}

/// Proximity-density index: the sum of `1 / (1 + d)` over `distances_km`.
///
/// Nearby facilities contribute close to 1, distant ones close to 0.
#[must_use]
pub fn distance_weighted_index<I>(distances_km: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    distances_km.into_iter().map(|d| 1.0 / (1.0 + d)).sum()
}
