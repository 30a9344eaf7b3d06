//! Review cleaning and deduplication.

use std::collections::BTreeSet;

use site_insight_geography_models::{Review, ReviewColumns};

use crate::normalize::normalize_text;

/// A review that survived cleaning, with its normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReview<'a> {
    /// The source review.
    pub review: &'a Review,
    /// Lowercased, whitespace-collapsed text. Never empty.
    pub normalized: String,
}

/// Normalizes review texts and drops those that end up empty.
#[must_use]
pub fn clean<'a, I>(reviews: I) -> Vec<CleanReview<'a>>
where
    I: IntoIterator<Item = &'a Review>,
{
    reviews
        .into_iter()
        .filter_map(|review| {
            let normalized = normalize_text(&review.text);
            (!normalized.is_empty()).then_some(CleanReview { review, normalized })
        })
        .collect()
}

/// Identity used to spot duplicate reviews, chosen from the columns the
/// dataset carries: facility identifier, else facility name, else text
/// alone.
fn local_key<'r>(clean: &'r CleanReview<'_>, columns: ReviewColumns) -> (Option<&'r str>, &'r str) {
    let facility = if columns.facility_id {
        clean.review.facility_id.as_deref()
    } else if columns.facility_name {
        clean.review.facility_name.as_deref()
    } else {
        None
    };
    (facility, clean.normalized.as_str())
}

/// Removes duplicate reviews of one unit.
///
/// With a timestamp column the newest review of each duplicate group is
/// kept and survivors come back newest first (reviews without a timestamp
/// sort last, ties keep their input order); otherwise the first seen is
/// kept and input order is preserved. Applying this twice changes nothing.
#[must_use]
pub fn dedup_local<'a>(mut reviews: Vec<CleanReview<'a>>, columns: ReviewColumns) -> Vec<CleanReview<'a>> {
    if columns.timestamp {
        // Stable, so equal timestamps keep their input order.
        reviews.sort_by_key(|clean| std::cmp::Reverse(clean.review.timestamp));
    }

    let keep: Vec<bool> = {
        let mut seen = BTreeSet::new();
        reviews
            .iter()
            .map(|clean| seen.insert(local_key(clean, columns)))
            .collect()
    };

    reviews
        .into_iter()
        .zip(keep)
        .filter_map(|(review, keep)| keep.then_some(review))
        .collect()
}

/// Removes duplicate reviews across the whole dataset, per unit and
/// facility identifier (when the dataset has one) and text, keeping the
/// first seen.
#[must_use]
pub fn dedup_region<'a>(reviews: Vec<CleanReview<'a>>, columns: ReviewColumns) -> Vec<CleanReview<'a>> {
    let mut seen = BTreeSet::new();
    reviews
        .into_iter()
        .filter(|clean| {
            let facility = if columns.facility_id {
                clean.review.facility_id.clone()
            } else {
                None
            };
            seen.insert((
                clean.review.unit_id.clone(),
                facility,
                clean.normalized.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(text: &str, facility: Option<&str>, timestamp: Option<i64>) -> Review {
        Review {
            unit_id: "A".to_string(),
            text: text.to_string(),
            timestamp,
            facility_id: facility.map(ToString::to_string),
            facility_name: None,
            rating: None,
        }
    }

    fn texts(reviews: &[CleanReview<'_>]) -> Vec<(String, Option<i64>)> {
        reviews
            .iter()
            .map(|c| (c.review.text.clone(), c.review.timestamp))
            .collect()
    }

    #[test]
    fn clean_drops_empty_texts() {
        let reviews = vec![
            review("  ", None, None),
            review("Great", None, None),
            review("\t\n", None, None),
        ];
        let cleaned = clean(&reviews);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].normalized, "great");
    }

    #[test]
    fn keeps_newest_duplicate_when_timestamped() {
        let reviews = vec![
            review("Great  care", Some("p1"), Some(100)),
            review("great care", Some("p1"), Some(300)),
            review("great care", Some("p1"), None),
            review("great care", Some("p2"), Some(50)),
        ];
        let columns = ReviewColumns {
            facility_id: true,
            facility_name: false,
            timestamp: true,
        };
        let deduped = dedup_local(clean(&reviews), columns);
        assert_eq!(
            texts(&deduped),
            vec![
                ("great care".to_string(), Some(300)),
                ("great care".to_string(), Some(50)),
            ]
        );
    }

    #[test]
    fn survivors_come_back_newest_first() {
        let reviews = vec![
            review("old", Some("p1"), Some(10)),
            review("undated", Some("p1"), None),
            review("new", Some("p1"), Some(30)),
            review("middle", Some("p2"), Some(20)),
            review("also middle", Some("p3"), Some(20)),
        ];
        let columns = ReviewColumns {
            facility_id: true,
            facility_name: false,
            timestamp: true,
        };
        let deduped = dedup_local(clean(&reviews), columns);
        let order: Vec<&str> = deduped.iter().map(|c| c.review.text.as_str()).collect();
        assert_eq!(order, vec!["new", "middle", "also middle", "old", "undated"]);
    }

    #[test]
    fn keeps_input_order_without_timestamp_column() {
        let reviews = vec![
            review("b", Some("p1"), Some(1)),
            review("a", Some("p1"), Some(9)),
        ];
        let columns = ReviewColumns {
            facility_id: true,
            facility_name: false,
            timestamp: false,
        };
        let deduped = dedup_local(clean(&reviews), columns);
        assert_eq!(
            texts(&deduped),
            vec![("b".to_string(), Some(1)), ("a".to_string(), Some(9))]
        );
    }

    #[test]
    fn keeps_first_duplicate_without_timestamps() {
        let reviews = vec![
            review("Slow", Some("p1"), Some(1)),
            review("slow", Some("p2"), Some(2)),
        ];
        // Without a facility column both reviews share a key.
        let deduped = dedup_local(clean(&reviews), ReviewColumns::default());
        assert_eq!(texts(&deduped), vec![("Slow".to_string(), Some(1))]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let reviews = vec![
            review("a", Some("p1"), Some(1)),
            review("b", Some("p1"), Some(2)),
            review("a", Some("p1"), Some(3)),
            review("A", Some("p2"), None),
            review("b", Some("p1"), None),
        ];
        let columns = ReviewColumns {
            facility_id: true,
            facility_name: false,
            timestamp: true,
        };
        let once = dedup_local(clean(&reviews), columns);
        let twice = dedup_local(once.clone(), columns);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn region_dedup_is_per_unit() {
        let mut other_unit = review("same", None, None);
        other_unit.unit_id = "B".to_string();
        let reviews = vec![
            review("same", None, None),
            review("Same", None, None),
            other_unit,
        ];
        let deduped = dedup_region(clean(&reviews), ReviewColumns::default());
        assert_eq!(deduped.len(), 2);
    }
}
