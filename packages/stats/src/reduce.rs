//! Missing-aware reductions.
//!
//! Every reduction skips missing values. Reducing nothing yields `None`
//! rather than zero or an error.

use site_insight_geography_models::{Field, GeoUnit};

/// Mean of the present values.
#[must_use]
pub fn mean_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (total, count) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0u32), |(total, count), v| (total + v, count + 1));

    (count > 0).then(|| total / f64::from(count))
}

/// Sum of the present values.
#[must_use]
pub fn sum_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Median of the present values. Even-length inputs average the two
/// middle values.
#[must_use]
pub fn median_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut present: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();

    if present.is_empty() {
        return None;
    }

    present.sort_by(f64::total_cmp);
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some(f64::midpoint(present[mid - 1], present[mid]))
    } else {
        Some(present[mid])
    }
}

/// Mean of `field` over `units`.
#[must_use]
pub fn mean(field: Field, units: &[&GeoUnit]) -> Option<f64> {
    mean_of(units.iter().map(|u| u.attribute(field)))
}

/// Sum of `field` over `units`.
#[must_use]
pub fn sum(field: Field, units: &[&GeoUnit]) -> Option<f64> {
    sum_of(units.iter().map(|u| u.attribute(field)))
}

/// Median of `field` over `units`.
#[must_use]
pub fn median(field: Field, units: &[&GeoUnit]) -> Option<f64> {
    median_of(units.iter().map(|u| u.attribute(field)))
}

/// Number of units with a present value for `field`.
#[must_use]
pub fn count_present(field: Field, units: &[&GeoUnit]) -> usize {
    units
        .iter()
        .filter(|u| u.attribute(field).is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_skip_missing() {
        let values = [Some(1.0), None, Some(3.0)];
        assert_eq!(mean_of(values), Some(2.0));
        assert_eq!(sum_of(values), Some(4.0));
        assert_eq!(median_of(values), Some(2.0));
    }

    #[test]
    fn empty_reductions_are_missing() {
        assert_eq!(mean_of([]), None);
        assert_eq!(sum_of([]), None);
        assert_eq!(median_of([]), None);
        assert_eq!(mean_of([None, None]), None);
        assert_eq!(sum_of([None]), None);
    }

    #[test]
    fn median_of_even_count_averages_middle() {
        assert_eq!(median_of([Some(4.0), Some(1.0), Some(3.0), Some(2.0)]), Some(2.5));
        assert_eq!(median_of([Some(5.0)]), Some(5.0));
    }

    #[test]
    fn non_finite_values_are_skipped() {
        assert_eq!(mean_of([Some(f64::INFINITY), Some(2.0)]), Some(2.0));
        assert_eq!(sum_of([Some(f64::NAN)]), None);
    }
}
