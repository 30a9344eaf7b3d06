#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loaders for the region, facility, and review datasets.
//!
//! Every dataset is read into a [`RawTable`] first, from CSV or from a
//! `GeoJSON` feature collection whose properties become columns and whose
//! geometry lands in a `geometry` column as `GeoJSON` text. Typed readers
//! then resolve their columns against that table.

pub mod facilities;
pub mod reviews;
pub mod table;

use std::path::Path;

use site_insight_geography_models::{Facility, ReviewDataset};
use site_insight_stats::{RawTable, RegionStatsStore, StatsError};
use thiserror::Error;

pub use facilities::facilities_from_table;
pub use reviews::reviews_from_table;
pub use table::{table_from_csv, table_from_geojson};

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid CSV.
    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        /// File path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The file is not valid `GeoJSON`.
    #[error("Failed to parse GeoJSON {path}: {source}")]
    GeoJson {
        /// File path.
        path: String,
        /// Underlying `GeoJSON` error.
        source: Box<geojson::Error>,
    },

    /// The file extension is not one the loaders understand.
    #[error("Unsupported file format for {path} (expected .csv, .geojson, or .json)")]
    UnsupportedFormat {
        /// File path.
        path: String,
    },

    /// A column the dataset cannot be used without is absent.
    #[error("{dataset} data is missing required column '{column}'")]
    MissingColumn {
        /// Which dataset was being read.
        dataset: &'static str,
        /// Name of the missing column.
        column: String,
    },

    /// The region table could not be turned into units.
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Reads a CSV or `GeoJSON` file into a [`RawTable`], choosing the parser
/// by file extension.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed, or has an
/// unrecognized extension.
pub fn read_table(path: &Path) -> Result<RawTable, IngestError> {
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => {
            let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
                path: display.clone(),
                source,
            })?;
            table_from_csv(file).map_err(|source| IngestError::Csv {
                path: display,
                source,
            })
        }
        Some("geojson" | "json") => {
            let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
                path: display.clone(),
                source,
            })?;
            table_from_geojson(&text).map_err(|source| IngestError::GeoJson {
                path: display,
                source: Box::new(source),
            })
        }
        _ => Err(IngestError::UnsupportedFormat { path: display }),
    }
}

/// Loads the region dataset into a [`RegionStatsStore`].
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or lacks the unit
/// identifier or geometry column.
pub fn load_region(path: &Path) -> Result<RegionStatsStore, IngestError> {
    let table = read_table(path)?;
    log::info!(
        "Read {} region rows from {}",
        table.rows.len(),
        path.display()
    );
    Ok(RegionStatsStore::from_table(&table)?)
}

/// Loads a facility dataset. Facilities without a unit identifier column
/// are assigned to the unit containing them when a `store` is given.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or carries no
/// coordinates.
pub fn load_facilities(
    path: &Path,
    store: Option<&RegionStatsStore>,
) -> Result<Vec<Facility>, IngestError> {
    let table = read_table(path)?;
    let facilities = facilities_from_table(&table, store)?;
    log::info!(
        "Loaded {} facilities from {}",
        facilities.len(),
        path.display()
    );
    Ok(facilities)
}

/// Loads a review dataset.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or lacks the unit
/// identifier or text column.
pub fn load_reviews(path: &Path) -> Result<ReviewDataset, IngestError> {
    let table = read_table(path)?;
    let dataset = reviews_from_table(&table)?;
    log::info!(
        "Loaded {} reviews from {}",
        dataset.reviews.len(),
        path.display()
    );
    Ok(dataset)
}

/// Position of the first header equal to any of `names`, ignoring case
/// and surrounding whitespace.
pub(crate) fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}
