//! Review rows to a [`ReviewDataset`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use site_insight_geography_models::{Review, ReviewColumns, ReviewDataset};
use site_insight_stats::{RawTable, coerce_numeric};

use crate::{IngestError, find_column};

fn required(headers: &[String], name: &str) -> Result<usize, IngestError> {
    find_column(headers, &[name]).ok_or_else(|| IngestError::MissingColumn {
        dataset: "Review",
        column: name.to_string(),
    })
}

/// Builds a review dataset from a raw table.
///
/// `DGUID` and `Text` are required. `Time`, `Place ID`, `Facility Name`
/// and `Rating` are optional; which of them the header carries is recorded
/// in [`ReviewColumns`] even when individual cells are empty.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if `DGUID` or `Text` is absent.
pub fn reviews_from_table(table: &RawTable) -> Result<ReviewDataset, IngestError> {
    let headers = &table.headers;
    let unit_col = required(headers, "DGUID")?;
    let text_col = required(headers, "Text")?;
    let time_col = find_column(headers, &["Time", "timestamp"]);
    let place_col = find_column(headers, &["Place ID", "place_id"]);
    let name_col = find_column(headers, &["Facility Name", "facility_name"]);
    let rating_col = find_column(headers, &["Rating"]);

    let mut unparsed_times = 0_usize;

    let reviews = table
        .rows
        .iter()
        .map(|row| {
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| row.get(i))
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
            };

            let timestamp = cell(time_col).and_then(|raw| {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    unparsed_times += 1;
                }
                parsed
            });

            Review {
                unit_id: cell(Some(unit_col)).unwrap_or_default().to_string(),
                text: row.get(text_col).cloned().unwrap_or_default(),
                timestamp,
                facility_id: cell(place_col).map(ToString::to_string),
                facility_name: cell(name_col).map(ToString::to_string),
                rating: cell(rating_col).and_then(coerce_numeric),
            }
        })
        .collect();

    if unparsed_times > 0 {
        log::warn!("{unparsed_times} review timestamp(s) could not be parsed");
    }

    Ok(ReviewDataset {
        reviews,
        columns: ReviewColumns {
            facility_id: place_col.is_some(),
            facility_name: name_col.is_some(),
            timestamp: time_col.is_some(),
        },
    })
}

/// Parses a review time as Unix seconds. Accepts integer or fractional
/// epoch seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) and `YYYY-MM-DD`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }
    if let Ok(secs) = raw.parse::<f64>() {
        #[allow(clippy::cast_possible_truncation)]
        let truncated = secs.trunc() as i64;
        return secs.is_finite().then_some(truncated);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table_from_csv;

    #[test]
    fn reads_all_columns() {
        let csv = "DGUID,Text,Time,Place ID,Facility Name,Rating\n\
                   U1,Great care,1700000000,p1,Clinic A,5\n\
                   U2,  Long wait ,,,,\n";
        let table = table_from_csv(csv.as_bytes()).unwrap();
        let dataset = reviews_from_table(&table).unwrap();

        assert_eq!(
            dataset.columns,
            ReviewColumns {
                facility_id: true,
                facility_name: true,
                timestamp: true,
            }
        );
        assert_eq!(dataset.reviews.len(), 2);

        let first = &dataset.reviews[0];
        assert_eq!(first.unit_id, "U1");
        assert_eq!(first.text, "Great care");
        assert_eq!(first.timestamp, Some(1_700_000_000));
        assert_eq!(first.facility_id.as_deref(), Some("p1"));
        assert_eq!(first.facility_name.as_deref(), Some("Clinic A"));
        assert_eq!(first.rating, Some(5.0));

        let second = &dataset.reviews[1];
        assert_eq!(second.text, "  Long wait ");
        assert_eq!(second.timestamp, None);
        assert_eq!(second.facility_id, None);
        assert_eq!(second.rating, None);
    }

    #[test]
    fn optional_columns_are_flagged_absent() {
        let table = table_from_csv("DGUID,Text\nU1,Fine\n".as_bytes()).unwrap();
        let dataset = reviews_from_table(&table).unwrap();
        assert_eq!(dataset.columns, ReviewColumns::default());
        assert_eq!(dataset.reviews[0].timestamp, None);
    }

    #[test]
    fn missing_text_column_is_an_error() {
        let table = table_from_csv("DGUID,Body\nU1,Fine\n".as_bytes()).unwrap();
        match reviews_from_table(&table) {
            Err(IngestError::MissingColumn { dataset, column }) => {
                assert_eq!(dataset, "Review");
                assert_eq!(column, "Text");
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn parses_timestamp_formats() {
        assert_eq!(parse_timestamp("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_timestamp("1700000000.9"), Some(1_700_000_000));
        assert_eq!(parse_timestamp("1970-01-02T00:00:00Z"), Some(86_400));
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_timestamp("1970-01-01 00:01:00"), Some(60));
        assert_eq!(parse_timestamp("1970-01-03"), Some(172_800));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
