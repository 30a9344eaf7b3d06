//! Facility rows to [`Facility`] values.

use site_insight_geography_models::Facility;
use site_insight_stats::{RawTable, RegionStatsStore, coerce_numeric};

use crate::{IngestError, find_column, table::GEOMETRY_COLUMN};

struct FacilityColumns {
    id: Option<usize>,
    name: Option<usize>,
    address: Option<usize>,
    rating: Option<usize>,
    review_count: Option<usize>,
    tags: Option<usize>,
    unit_id: Option<usize>,
    location: Location,
}

enum Location {
    LatLon { lat: usize, lon: usize },
    Geometry(usize),
}

impl FacilityColumns {
    fn resolve(headers: &[String]) -> Result<Self, IngestError> {
        let lat = find_column(headers, &["latitude", "lat"]);
        let lon = find_column(headers, &["longitude", "lon", "lng"]);
        let location = match (lat, lon) {
            (Some(lat), Some(lon)) => Location::LatLon { lat, lon },
            _ => find_column(headers, &[GEOMETRY_COLUMN])
                .map(Location::Geometry)
                .ok_or_else(|| IngestError::MissingColumn {
                    dataset: "Facility",
                    column: "Latitude/Longitude or geometry".to_string(),
                })?,
        };

        Ok(Self {
            id: find_column(headers, &["place id", "place_id", "id"]),
            name: find_column(headers, &["name"]),
            address: find_column(headers, &["address", "formatted_address"]),
            rating: find_column(headers, &["rating"]),
            review_count: find_column(headers, &["user ratings total", "user_ratings_total"]),
            tags: find_column(headers, &["types", "tags"]),
            unit_id: find_column(headers, &["dguid"]),
            location,
        })
    }
}

/// Builds facilities from a raw table.
///
/// Coordinates come from `Latitude`/`Longitude` columns when both exist,
/// otherwise from the `geometry` column (points as-is, other shapes by
/// centroid). Rows without usable coordinates are skipped with a warning.
/// The owning unit is read from a `DGUID` column; when the column or the
/// row's cell is missing, the facility is resolved against `store` when it
/// is given.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if the table has neither
/// coordinate columns nor a geometry column.
pub fn facilities_from_table(
    table: &RawTable,
    store: Option<&RegionStatsStore>,
) -> Result<Vec<Facility>, IngestError> {
    let columns = FacilityColumns::resolve(&table.headers)?;
    let mut skipped = 0_usize;
    let mut facilities = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };

        let coordinates = match columns.location {
            Location::LatLon { lat, lon } => cell(Some(lat))
                .and_then(coerce_numeric)
                .zip(cell(Some(lon)).and_then(coerce_numeric)),
            Location::Geometry(idx) => cell(Some(idx))
                .and_then(site_insight_spatial::parse_location)
                .map(|p| (p.y(), p.x())),
        };
        let Some((latitude, longitude)) = coordinates.filter(|&(lat, lon)| {
            (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
        }) else {
            skipped += 1;
            continue;
        };

        let unit_id = cell(columns.unit_id).map(ToString::to_string).or_else(|| {
            store
                .and_then(|s| s.resolve(latitude, longitude))
                .map(ToString::to_string)
        });

        facilities.push(Facility {
            id: cell(columns.id).map(ToString::to_string),
            name: cell(columns.name).unwrap_or_default().to_string(),
            address: cell(columns.address).unwrap_or_default().to_string(),
            latitude,
            longitude,
            rating: cell(columns.rating).and_then(coerce_numeric),
            review_count: cell(columns.review_count).and_then(coerce_numeric),
            tags: cell(columns.tags).map(parse_tags).unwrap_or_default(),
            unit_id,
        });
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} facility row(s) without usable coordinates");
    }

    Ok(facilities)
}

/// Splits a tag cell. Accepts a JSON array of strings, a Python-style
/// list literal, or plain comma-separated text.
fn parse_tags(raw: &str) -> Vec<String> {
    if let Ok(tags) = serde_json::from_str::<Vec<String>>(raw) {
        return tags;
    }

    raw.split(',')
        .map(|t| t.trim().trim_matches(|c| matches!(c, '[' | ']' | '\'' | '"')).trim())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{MultiPolygon, polygon};
    use site_insight_geography_models::GeoUnit;

    use super::*;
    use crate::table::{table_from_csv, table_from_geojson};

    #[test]
    fn reads_csv_facilities() {
        let csv = "Name,Address,Latitude,Longitude,Rating,User Ratings Total,types,DGUID,Place ID\n\
                   Clinic A,1 Main St,43.7,-79.4,4.5,120,\"['doctor', 'health']\",U1,p1\n\
                   Clinic B,2 Main St,43.8,-79.5,,,,U2,\n";
        let table = table_from_csv(csv.as_bytes()).unwrap();
        let facilities = facilities_from_table(&table, None).unwrap();

        assert_eq!(facilities.len(), 2);
        let a = &facilities[0];
        assert_eq!(a.name, "Clinic A");
        assert_eq!(a.address, "1 Main St");
        assert!((a.latitude - 43.7).abs() < 1e-12);
        assert!((a.longitude - -79.4).abs() < 1e-12);
        assert_eq!(a.rating, Some(4.5));
        assert_eq!(a.review_count, Some(120.0));
        assert_eq!(a.tags, vec!["doctor", "health"]);
        assert_eq!(a.unit_id.as_deref(), Some("U1"));
        assert_eq!(a.id.as_deref(), Some("p1"));

        let b = &facilities[1];
        assert_eq!(b.rating, None);
        assert_eq!(b.review_count, None);
        assert!(b.tags.is_empty());
        assert_eq!(b.id, None);
    }

    #[test]
    fn reads_geojson_points() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "Pharmacy", "types": ["pharmacy", "store"], "rating": 4.1},
                "geometry": {"type": "Point", "coordinates": [-79.4, 43.7]}
            }]
        }"#;
        let table = table_from_geojson(text).unwrap();
        let facilities = facilities_from_table(&table, None).unwrap();

        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].name, "Pharmacy");
        assert_eq!(facilities[0].tags, vec!["pharmacy", "store"]);
        assert_eq!(facilities[0].rating, Some(4.1));
        assert!((facilities[0].latitude - 43.7).abs() < 1e-12);
        assert_eq!(facilities[0].unit_id, None);
    }

    fn one_unit_store() -> RegionStatsStore {
        RegionStatsStore::from_units(vec![GeoUnit {
            id: "U1".to_string(),
            boundary: MultiPolygon(vec![polygon![
                (x: -80.0, y: 43.0),
                (x: -79.0, y: 43.0),
                (x: -79.0, y: 44.0),
                (x: -80.0, y: 44.0),
                (x: -80.0, y: 43.0),
            ]]),
            attributes: BTreeMap::new(),
        }])
    }

    #[test]
    fn resolves_unit_when_no_identifier_column() {
        let store = one_unit_store();
        let csv = "Name,Lat,Lon\nInside,43.5,-79.5\nOutside,10,10\n";
        let table = table_from_csv(csv.as_bytes()).unwrap();
        let facilities = facilities_from_table(&table, Some(&store)).unwrap();

        assert_eq!(facilities[0].unit_id.as_deref(), Some("U1"));
        assert_eq!(facilities[1].unit_id, None);
    }

    #[test]
    fn resolves_unit_when_identifier_cell_is_empty() {
        let store = one_unit_store();
        let csv = "Name,Lat,Lon,DGUID\nTagged,43.5,-79.5,U9\nBlank,43.5,-79.5,\nOutside,10,10,\n";
        let table = table_from_csv(csv.as_bytes()).unwrap();
        let facilities = facilities_from_table(&table, Some(&store)).unwrap();

        let units: Vec<Option<&str>> = facilities.iter().map(|f| f.unit_id.as_deref()).collect();
        assert_eq!(units, vec![Some("U9"), Some("U1"), None]);
    }

    #[test]
    fn skips_rows_without_coordinates() {
        let csv = "Name,Latitude,Longitude\nGood,43.7,-79.4\nBlank,,\nBad,abc,-79.4\nFar,95,0\n";
        let table = table_from_csv(csv.as_bytes()).unwrap();
        let facilities = facilities_from_table(&table, None).unwrap();
        let names: Vec<&str> = facilities.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Good"]);
    }

    #[test]
    fn missing_location_columns_is_an_error() {
        let table = table_from_csv("Name,Address\nA,B\n".as_bytes()).unwrap();
        assert!(matches!(
            facilities_from_table(&table, None),
            Err(IngestError::MissingColumn { dataset: "Facility", .. })
        ));
    }

    #[test]
    fn parses_tag_formats() {
        assert_eq!(parse_tags(r#"["a", "b"]"#), vec!["a", "b"]);
        assert_eq!(parse_tags("['a', 'b']"), vec!["a", "b"]);
        assert_eq!(parse_tags("a, b ,"), vec!["a", "b"]);
        assert!(parse_tags("[]").is_empty());
    }
}
