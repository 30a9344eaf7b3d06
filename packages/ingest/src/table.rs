//! CSV and `GeoJSON` readers producing a [`RawTable`].

use std::io::Read;

use geojson::{Feature, GeoJson};
use site_insight_stats::RawTable;

/// Column that holds each feature's geometry as `GeoJSON` text.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// Reads CSV with a header row. Short rows are padded with empty cells.
///
/// # Errors
///
/// Returns [`csv::Error`] if the input is not valid CSV.
pub fn table_from_csv<R: Read>(reader: R) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(ToString::to_string).collect();
        row.resize(headers.len().max(row.len()), String::new());
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

/// Reads a `GeoJSON` document. Feature properties become columns in
/// first-seen order, followed by a [`GEOMETRY_COLUMN`]. String properties
/// are taken as-is, `null` becomes an empty cell, and anything else is
/// written as JSON.
///
/// # Errors
///
/// Returns [`geojson::Error`] if the input is not valid `GeoJSON`.
pub fn table_from_geojson(text: &str) -> Result<RawTable, geojson::Error> {
    let features: Vec<Feature> = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature {
            geometry: Some(g),
            ..Feature::default()
        }],
    };

    let mut headers: Vec<String> = Vec::new();
    for feature in &features {
        for key in feature.properties.iter().flat_map(|p| p.keys()) {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }
    let has_geometry_property = headers.iter().any(|h| h == GEOMETRY_COLUMN);
    if !has_geometry_property {
        headers.push(GEOMETRY_COLUMN.to_string());
    }

    let rows = features
        .iter()
        .map(|feature| {
            headers
                .iter()
                .map(|header| {
                    if header == GEOMETRY_COLUMN && !has_geometry_property {
                        return feature
                            .geometry
                            .as_ref()
                            .and_then(|g| serde_json::to_string(g).ok())
                            .unwrap_or_default();
                    }
                    feature
                        .property(header)
                        .map(cell_text)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
