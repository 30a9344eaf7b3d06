//! Region-wide baseline reductions.

use site_insight_analytics_models::BaselineMethod;
use site_insight_stats::{mean_of, median_of};

/// Reduces per-unit values with `method`, skipping missing values.
#[must_use]
pub fn reduce<I>(method: BaselineMethod, values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    match method {
        BaselineMethod::Mean => mean_of(values),
        BaselineMethod::Median => median_of(values),
    }
}
