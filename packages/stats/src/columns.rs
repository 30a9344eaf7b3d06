//! Column alias resolution and numeric coercion.
//!
//! Census extracts rename columns between releases ("Population, 2021"
//! vs "Population 2021"). Every canonical field lists the names it may
//! appear under; the first one present in the header wins.

use std::collections::BTreeMap;

use site_insight_geography_models::Field;
use strum::IntoEnumIterator as _;

/// Names the unit identifier column may appear under.
pub const UNIT_ID_ALIASES: &[&str] = &["DGUID"];

/// Names the boundary geometry column may appear under.
pub const GEOMETRY_ALIASES: &[&str] = &["geometry"];

/// Returns the source column names `field` may appear under, in
/// priority order.
#[must_use]
pub const fn aliases(field: Field) -> &'static [&'static str] {
    match field {
        Field::Population2021 => &["Population, 2021", "Population 2021"],
        Field::Density => &[
            "Population density per square kilometre",
            "Population density",
        ],
        Field::Growth => &[
            "Population percentage change, 2016 to 2021",
            "Population growth 2016-2021",
        ],
        Field::MedianIncome2020 => &[
            "Median total income in 2020 among recipients ($)",
            "Median income 2020",
        ],
        Field::AverageIncome2020 => &[
            "Average total income in 2020 among recipients ($)",
            "Average income 2020",
        ],
        Field::AgeTotal => &["Total - Age groups of the population - 100% data"],
        Field::Age0To14 => &["0 to 14 years", "0-14 years"],
        Field::Age15To64 => &["15 to 64 years", "15-64 years"],
        Field::Age65Plus => &["65 years and over", "65+ years"],
        Field::Age85Plus => &["85 years and over", "85+ years"],
    }
}

/// Normalizes a raw header: trims it and replaces en dashes with hyphens.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header.trim().replace('\u{2013}', "-")
}

/// Positions of the canonical columns within a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Position of the unit identifier column.
    pub unit_id: Option<usize>,
    /// Position of the geometry column.
    pub geometry: Option<usize>,
    /// Position and matched source name of each numeric field found.
    pub fields: BTreeMap<Field, (usize, String)>,
}

impl ResolvedColumns {
    /// Resolves canonical columns against `headers`.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();

        let find = |options: &[&str]| -> Option<(usize, String)> {
            options.iter().find_map(|option| {
                normalized
                    .iter()
                    .position(|h| h == option)
                    .map(|idx| (idx, (*option).to_string()))
            })
        };

        let fields = Field::iter()
            .filter_map(|field| find(aliases(field)).map(|found| (field, found)))
            .collect();

        Self {
            unit_id: find(UNIT_ID_ALIASES).map(|(idx, _)| idx),
            geometry: find(GEOMETRY_ALIASES).map(|(idx, _)| idx),
            fields,
        }
    }
}

/// Coerces free-form numeric text to a number.
///
/// Strips everything except digits, `.` and `-` (currency symbols,
/// thousands separators, percent signs) and parses the remainder.
/// Returns `None` when nothing parseable is left.
#[must_use]
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_formatted_numbers() {
        assert_eq!(coerce_numeric("1,234"), Some(1234.0));
        assert_eq!(coerce_numeric("$56,000"), Some(56000.0));
        assert_eq!(coerce_numeric(" 12.5% "), Some(12.5));
        assert_eq!(coerce_numeric("-3.2"), Some(-3.2));
        assert_eq!(coerce_numeric("42"), Some(42.0));
    }

    #[test]
    fn unparsable_numbers_become_missing() {
        assert_eq!(coerce_numeric(""), None);
        assert_eq!(coerce_numeric("x"), None);
        assert_eq!(coerce_numeric("..."), None);
        assert_eq!(coerce_numeric("1.2.3"), None);
        assert_eq!(coerce_numeric("-"), None);
        assert_eq!(coerce_numeric("NaN"), None);
    }

    #[test]
    fn resolves_first_alias_present() {
        let headers = [
            " DGUID ",
            "Population 2021",
            "Population, 2021",
            "geometry",
            "0\u{2013}14 years",
        ];
        let cols = ResolvedColumns::resolve(&headers);
        assert_eq!(cols.unit_id, Some(0));
        assert_eq!(cols.geometry, Some(3));
        assert_eq!(
            cols.fields.get(&Field::Population2021),
            Some(&(2, "Population, 2021".to_string()))
        );
        assert_eq!(
            cols.fields.get(&Field::Age0To14),
            Some(&(4, "0-14 years".to_string()))
        );
        assert!(!cols.fields.contains_key(&Field::Density));
    }

    #[test]
    fn missing_required_columns_resolve_to_none() {
        let cols = ResolvedColumns::resolve(&["Population 2021"]);
        assert_eq!(cols.unit_id, None);
        assert_eq!(cols.geometry, None);
    }
}
