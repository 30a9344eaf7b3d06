//! Plain-text rendering of a [`MarketReport`].

use std::fmt::Write as _;

use site_insight_analytics_models::{Comparison, MarketReport, format_optional};
use site_insight_geography_models::Field;

fn comparison_line(out: &mut String, label: &str, c: &Comparison, precision: usize) {
    let direction = c.direction.map_or_else(String::new, |d| d.to_string());
    let _ = writeln!(
        out,
        "  {label:<28} {:>12}  vs {:>12}  ({}) {direction}",
        format_optional(c.selected, precision),
        format_optional(c.baseline, precision),
        format_optional(c.delta, precision),
    );
}

/// Renders `report` as an aligned text summary. Missing values show as
/// `N/A`; absent sections are noted as unavailable.
#[must_use]
pub fn render_text(report: &MarketReport) -> String {
    let mut out = String::new();
    let request = &report.request;
    let _ = writeln!(
        out,
        "Site ({:.6}, {:.6}) in unit {}, radius {} km, {} baseline",
        request.latitude, request.longitude, report.unit_id, request.radius_km, request.baseline_method,
    );

    let _ = writeln!(
        out,
        "  Unit population (2021): {}",
        format_optional(
            report.selected_unit.get(&Field::Population2021).copied().flatten(),
            0
        )
    );

    out.push_str("\nDemographics\n");
    match &report.demographics {
        Some(d) => {
            let _ = writeln!(out, "  Units in radius: {}", d.unit_ids_in_radius.len());
            comparison_line(&mut out, "Population", &d.population, 0);
            comparison_line(&mut out, "Median income (2020)", &d.median_income, 0);
            comparison_line(&mut out, "Average income (2020)", &d.average_income, 0);
            comparison_line(&mut out, "Density", &d.density, 1);
            comparison_line(&mut out, "Growth (%)", &d.growth, 2);
            for band in &d.age_bands {
                comparison_line(&mut out, &format!("{} share", band.band), &band.share, 3);
            }
        }
        None => out.push_str("  unavailable\n"),
    }

    out.push_str("\nCompetitors\n");
    match &report.competitors {
        Some(c) => {
            let _ = writeln!(out, "  Count in radius: {}", c.facilities.len());
            comparison_line(&mut out, "Population per facility", &c.population_per_facility, 0);
            comparison_line(&mut out, "Facilities per 1,000", &c.facilities_per_1000, 3);
            comparison_line(&mut out, "Average rating", &c.average_rating, 2);
            comparison_line(&mut out, "Reviews per 1,000", &c.reviews_per_1000, 2);
        }
        None => out.push_str("  unavailable\n"),
    }

    out.push_str("\nSupport\n");
    match &report.support {
        Some(s) => {
            let _ = writeln!(
                out,
                "  Rows: {} total, {} after filter{}",
                s.rows_total,
                s.rows_after_filter,
                if s.keyword_filter_applied { " (keyword filter)" } else { "" },
            );
            comparison_line(&mut out, "Support facilities", &s.support_count, 0);
            comparison_line(&mut out, "Support per competitor", &s.support_per_competitor, 2);
            let _ = writeln!(
                out,
                "  Nearest support (km): {}",
                format_optional(s.nearest_support_km, 2)
            );
            let _ = writeln!(
                out,
                "  Distance-weighted index: {:.3}",
                s.distance_weighted_index
            );
        }
        None => out.push_str("  unavailable\n"),
    }

    out.push_str("\nSentiment\n");
    match &report.sentiment {
        Some(s) => {
            let _ = writeln!(
                out,
                "  Reviews: {} raw, {} cleaned, {} deduped, {} non-neutral{}",
                s.provenance.raw,
                s.provenance.cleaned,
                s.provenance.deduped,
                s.provenance.non_neutral,
                if s.low_confidence { " (low confidence)" } else { "" },
            );
            let _ = writeln!(
                out,
                "  Positive {} / Negative {} / Neutral {}, ratio {}",
                s.positive, s.negative, s.neutral, s.ratio
            );
            comparison_line(&mut out, "Positive share", &s.positive_share, 3);
            comparison_line(&mut out, "Negative share", &s.negative_share, 3);
            if s.has_recurring_issues {
                out.push_str("  Issues:\n");
                for issue in s.issues.iter().filter(|i| i.all_mentions > 0) {
                    let _ = writeln!(
                        out,
                        "    {:<34} {:>3} negative ({:.1}%), {:>3} total{}",
                        issue.issue,
                        issue.negative_mentions,
                        issue.share_of_negatives,
                        issue.all_mentions,
                        issue
                            .example_phrase
                            .as_ref()
                            .map_or_else(String::new, |p| format!(", e.g. \"{p}\"")),
                    );
                }
            } else {
                out.push_str("  No recurring issues\n");
            }
        }
        None => out.push_str("  unavailable\n"),
    }

    out
}
