#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory store of per-unit demographic and economic attributes.
//!
//! Builds [`GeoUnit`]s from a loosely-typed table: headers are resolved
//! through an alias table, numeric cells are coerced (unparsable values
//! become missing), and boundaries are indexed for point resolution and
//! buffer intersection.

pub mod columns;
pub mod reduce;

use std::collections::BTreeMap;

use geo::Polygon;
use site_insight_geography_models::{Field, GeoUnit};
use site_insight_spatial::UnitIndex;
use thiserror::Error;

pub use columns::{ResolvedColumns, coerce_numeric};
pub use reduce::{count_present, mean, mean_of, median, median_of, sum, sum_of};

/// Errors that can occur while building or querying the store.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A column the store cannot work without is absent.
    #[error("Required column '{column}' not found (accepted names: {accepted})")]
    MissingColumn {
        /// Canonical column name.
        column: &'static str,
        /// Comma-separated accepted source names.
        accepted: String,
    },

    /// The requested unit is not in the store.
    #[error("Unit '{unit_id}' not found in region data")]
    MissingUnit {
        /// The identifier that was looked up.
        unit_id: String,
    },
}

/// A header row plus string cells, as read from CSV or `GeoJSON`
/// properties.
///
/// The geometry column holds `GeoJSON` geometry text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column headers as they appear in the source.
    pub headers: Vec<String>,
    /// Rows of cells, aligned with `headers`. Short rows are padded with
    /// empty cells on read.
    pub rows: Vec<Vec<String>>,
}

/// Alias-resolved, coerced region attributes with a spatial index.
pub struct RegionStatsStore {
    units: Vec<GeoUnit>,
    index: UnitIndex,
    by_id: BTreeMap<String, usize>,
    columns: BTreeMap<Field, String>,
    malformed: BTreeMap<Field, usize>,
}

impl RegionStatsStore {
    /// Builds the store from a raw table.
    ///
    /// Rows with an empty identifier or an unparsable boundary are skipped
    /// with a warning. Unparsable numeric cells become missing values and
    /// are counted per field.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::MissingColumn`] if the identifier or geometry
    /// column cannot be resolved.
    pub fn from_table(table: &RawTable) -> Result<Self, StatsError> {
        let resolved = ResolvedColumns::resolve(&table.headers);

        let unit_id_col = resolved.unit_id.ok_or_else(|| StatsError::MissingColumn {
            column: "DGUID",
            accepted: columns::UNIT_ID_ALIASES.join(", "),
        })?;
        let geometry_col = resolved.geometry.ok_or_else(|| StatsError::MissingColumn {
            column: "geometry",
            accepted: columns::GEOMETRY_ALIASES.join(", "),
        })?;

        let mut malformed: BTreeMap<Field, usize> = BTreeMap::new();
        let mut units = Vec::with_capacity(table.rows.len());

        for (row_idx, row) in table.rows.iter().enumerate() {
            let cell = |idx: usize| row.get(idx).map_or("", |s| s.trim());

            let id = cell(unit_id_col);
            if id.is_empty() {
                log::warn!("Skipping region row {row_idx}: empty unit identifier");
                continue;
            }

            let Some(boundary) = site_insight_spatial::parse_boundary(cell(geometry_col)) else {
                log::warn!("Skipping region unit {id}: unparsable boundary");
                continue;
            };

            let attributes = resolved
                .fields
                .iter()
                .map(|(&field, &(idx, _))| {
                    let raw = cell(idx);
                    let value = coerce_numeric(raw);
                    if value.is_none() {
                        *malformed.entry(field).or_default() += 1;
                        log::trace!("Unit {id}: {field} value {raw:?} is not numeric");
                    }
                    (field, value)
                })
                .collect();

            units.push(GeoUnit {
                id: id.to_string(),
                boundary,
                attributes,
            });
        }

        for (field, count) in &malformed {
            log::warn!("{count} region value(s) for {field} were missing or not numeric");
        }

        let columns = resolved
            .fields
            .into_iter()
            .map(|(field, (_, name))| (field, name))
            .collect();

        let mut store = Self::from_units(units);
        store.columns = columns;
        store.malformed = malformed;
        Ok(store)
    }

    /// Builds the store from already-typed units.
    #[must_use]
    pub fn from_units(units: Vec<GeoUnit>) -> Self {
        let mut by_id = BTreeMap::new();
        for (idx, unit) in units.iter().enumerate() {
            if by_id.contains_key(&unit.id) {
                log::warn!("Duplicate unit identifier {}; lookups use the first", unit.id);
            } else {
                by_id.insert(unit.id.clone(), idx);
            }
        }

        let index = UnitIndex::new(&units);
        log::info!("Loaded {} region units", units.len());

        Self {
            units,
            index,
            by_id,
            columns: BTreeMap::new(),
            malformed: BTreeMap::new(),
        }
    }

    /// All units in load order.
    #[must_use]
    pub fn units(&self) -> &[GeoUnit] {
        &self.units
    }

    /// All units as a borrowed subset, for reductions over the region.
    #[must_use]
    pub fn all(&self) -> Vec<&GeoUnit> {
        self.units.iter().collect()
    }

    /// Resolves a coordinate to the identifier of its enclosing unit.
    #[must_use]
    pub fn resolve(&self, lat: f64, lon: f64) -> Option<&str> {
        self.index.resolve(&self.units, lat, lon)
    }

    /// Units whose boundary intersects `area`, in load order.
    #[must_use]
    pub fn intersecting(&self, area: &Polygon<f64>) -> Vec<&GeoUnit> {
        self.index.intersecting(&self.units, area)
    }

    /// Looks up a unit by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::MissingUnit`] if no unit has this identifier.
    pub fn get_unit_row(&self, unit_id: &str) -> Result<&GeoUnit, StatsError> {
        self.by_id
            .get(unit_id)
            .map(|&idx| &self.units[idx])
            .ok_or_else(|| StatsError::MissingUnit {
                unit_id: unit_id.to_string(),
            })
    }

    /// Source column `field` was read from, if the table carried it.
    #[must_use]
    pub fn source_column(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Number of cells for `field` that were missing or not numeric.
    #[must_use]
    pub fn malformed_count(&self, field: Field) -> usize {
        self.malformed.get(&field).copied().unwrap_or(0)
    }

    /// Mean of `field` over `subset`.
    #[must_use]
    pub fn mean(&self, field: Field, subset: &[&GeoUnit]) -> Option<f64> {
        reduce::mean(field, subset)
    }

    /// Sum of `field` over `subset`.
    #[must_use]
    pub fn sum(&self, field: Field, subset: &[&GeoUnit]) -> Option<f64> {
        reduce::sum(field, subset)
    }

    /// Median of `field` over `subset`.
    #[must_use]
    pub fn median(&self, field: Field, subset: &[&GeoUnit]) -> Option<f64> {
        reduce::median(field, subset)
    }
}
