#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index and radius queries for site analysis.
//!
//! Builds an R-tree over geographic unit boundaries at load time and
//! provides point-in-polygon resolution, buffer intersection, and
//! geodesic facility filtering. All queries are read-only over the
//! loaded units and return freshly allocated results.

pub mod buffer;
pub mod distance;

use geo::{BoundingRect, Centroid, Contains, Intersects, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};
use site_insight_geography_models::GeoUnit;

pub use buffer::buffer_km;
pub use distance::{distance_weighted_index, facilities_within, geodesic_km};

/// A unit envelope stored in the R-tree, pointing back at the unit's
/// position in the indexed slice.
struct BoundaryEntry {
    ordinal: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the boundaries of a fixed slice of [`GeoUnit`]s.
///
/// The index stores positions, not units. Every query must be given the
/// same slice the index was built from.
pub struct UnitIndex {
    tree: RTree<BoundaryEntry>,
    len: usize,
}

impl UnitIndex {
    /// Builds the index for `units`.
    #[must_use]
    pub fn new(units: &[GeoUnit]) -> Self {
        let entries = units
            .iter()
            .enumerate()
            .filter_map(|(ordinal, unit)| {
                let Some(envelope) = compute_envelope(&unit.boundary) else {
                    log::warn!("Unit {} has an empty boundary, skipping", unit.id);
                    return None;
                };
                Some(BoundaryEntry { ordinal, envelope })
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} of {} unit boundaries", tree.size(), units.len());

        Self {
            tree,
            len: units.len(),
        }
    }

    /// Number of units the index was built from.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the index was built from an empty slice.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolves a coordinate to the identifier of the unit containing it.
    ///
    /// Points on a boundary are not contained. When several units contain
    /// the point, the one that comes first in `units` wins.
    #[must_use]
    pub fn resolve<'a>(&self, units: &'a [GeoUnit], lat: f64, lon: f64) -> Option<&'a str> {
        debug_assert_eq!(units.len(), self.len, "index built from another slice");

        let point = geo::Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.ordinal)
            .filter(|&ordinal| units[ordinal].boundary.contains(&point))
            .min()
            .map(|ordinal| units[ordinal].id.as_str())
    }

    /// Returns every unit whose boundary intersects `area`, in slice order.
    ///
    /// Partial overlap counts as intersection.
    #[must_use]
    pub fn intersecting<'a>(&self, units: &'a [GeoUnit], area: &Polygon<f64>) -> Vec<&'a GeoUnit> {
        debug_assert_eq!(units.len(), self.len, "index built from another slice");

        let Some(rect) = area.bounding_rect() else {
            return Vec::new();
        };
        let query_env =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        let mut ordinals: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.ordinal)
            .filter(|&ordinal| units[ordinal].boundary.intersects(area))
            .collect();
        ordinals.sort_unstable();

        ordinals.into_iter().map(|ordinal| &units[ordinal]).collect()
    }
}

/// Resolves a coordinate by scanning every unit in order.
///
/// Equivalent to [`UnitIndex::resolve`] without the index; useful for
/// one-off lookups against small collections.
#[must_use]
pub fn resolve(lat: f64, lon: f64, units: &[GeoUnit]) -> Option<&str> {
    let point = geo::Point::new(lon, lat);
    units
        .iter()
        .find(|unit| unit.boundary.contains(&point))
        .map(|unit| unit.id.as_str())
}

/// Parse a `GeoJSON` geometry string into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn parse_boundary(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    match geojson {
        GeoJson::Geometry(geom) => geometry_to_multipolygon(geom),
        GeoJson::Feature(feature) => feature.geometry.and_then(geometry_to_multipolygon),
        GeoJson::FeatureCollection(_) => None,
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`], if it is areal.
#[must_use]
pub fn geometry_to_multipolygon(geom: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Parses a `GeoJSON` geometry string into a single location. Points are
/// taken as-is; any other geometry is reduced to its centroid.
#[must_use]
pub fn parse_location(geojson_str: &str) -> Option<Point<f64>> {
    let geom = match geojson_str.parse::<GeoJson>().ok()? {
        GeoJson::Geometry(geom) => geom,
        GeoJson::Feature(feature) => feature.geometry?,
        GeoJson::FeatureCollection(_) => return None,
    };
    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
    match geo_geom {
        geo::Geometry::Point(p) => Some(p),
        other => other.centroid(),
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use geo::{MultiPolygon, polygon};
    use site_insight_geography_models::GeoUnit;

    /// Axis-aligned square unit with corners at `(lon0, lat0)` and
    /// `(lon1, lat1)`.
    pub fn square(id: &str, lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> GeoUnit {
        GeoUnit {
            id: id.to_string(),
            boundary: MultiPolygon(vec![polygon![
                (x: lon0, y: lat0),
                (x: lon1, y: lat0),
                (x: lon1, y: lat1),
                (x: lon0, y: lat1),
                (x: lon0, y: lat0),
            ]]),
            attributes: BTreeMap::new(),
        }
    }
}
