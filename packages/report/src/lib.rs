#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset bundle and the single analysis entry point.
//!
//! [`Datasets`] holds everything loaded once at startup. [`analyze`] turns
//! one [`AnalysisRequest`] into a [`MarketReport`], filling each section
//! whose dataset is available and leaving the rest `None`.

pub mod render;

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use site_insight_analytics::{
    AnalyticsError, SupportKeywordFilter, competitor_metrics, demographics, support_metrics,
};
use site_insight_analytics_models::{AnalysisRequest, MarketReport, RECOMMENDED_RADIUS_KM};
use site_insight_geography_models::{Facility, ReviewDataset};
use site_insight_sentiment::{
    LexiconScorer, SentimentError, SentimentIssueMiner, SentimentScorer, ShareBaseline,
};
use site_insight_stats::RegionStatsStore;
use thiserror::Error;

/// Errors that make a request unanswerable.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    /// The radius is zero, negative, or not finite.
    #[error("Radius must be a positive number of kilometres, got {radius_km}")]
    InvalidRadius {
        /// Requested radius.
        radius_km: f64,
    },

    /// The coordinate is outside WGS84 bounds.
    #[error("Coordinate ({latitude}, {longitude}) is out of range")]
    InvalidCoordinate {
        /// Requested latitude.
        latitude: f64,
        /// Requested longitude.
        longitude: f64,
    },
}

/// Errors building the dataset bundle's built-in definitions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The sentiment lexicon or issue taxonomy is invalid.
    #[error(transparent)]
    Sentiment(#[from] SentimentError),

    /// The support keyword filter is invalid.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

/// File locations of the four datasets. Any may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct DatasetPaths {
    /// Region units with attributes and boundaries.
    pub region: Option<PathBuf>,
    /// Competing facilities.
    pub competitors: Option<PathBuf>,
    /// Complementary support facilities.
    pub support: Option<PathBuf>,
    /// Customer reviews.
    pub reviews: Option<PathBuf>,
}

/// Immutable datasets plus the configured analysis components.
///
/// A dataset that failed to load is `None`; sections depending on it are
/// left out of every report.
pub struct Datasets<S = LexiconScorer> {
    region: Option<RegionStatsStore>,
    competitors: Option<Vec<Facility>>,
    support: Option<Vec<Facility>>,
    reviews: Option<ReviewDataset>,
    miner: SentimentIssueMiner<S>,
    sentiment_baseline: ShareBaseline,
    support_filter: SupportKeywordFilter,
}

impl Datasets<LexiconScorer> {
    /// Loads every dataset named in `paths` with the built-in lexicon,
    /// taxonomy, and support keyword filter.
    ///
    /// Load failures are logged once and leave that dataset absent.
    /// Facilities are assigned to units through the region dataset when
    /// they carry no unit identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] only if a built-in definition is invalid.
    pub fn load(paths: &DatasetPaths) -> Result<Self, ReportError> {
        let region = paths.region.as_deref().and_then(|path| {
            site_insight_ingest::load_region(path)
                .inspect_err(|e| log::error!("Region data unavailable: {e}"))
                .ok()
        });

        let facilities = |path: Option<&std::path::Path>, label: &str| {
            path.and_then(|path| {
                site_insight_ingest::load_facilities(path, region.as_ref())
                    .inspect_err(|e| log::error!("{label} data unavailable: {e}"))
                    .ok()
            })
        };
        let competitors = facilities(paths.competitors.as_deref(), "Competitor");
        let support = facilities(paths.support.as_deref(), "Support");

        let reviews = paths.reviews.as_deref().and_then(|path| {
            site_insight_ingest::load_reviews(path)
                .inspect_err(|e| log::error!("Review data unavailable: {e}"))
                .ok()
        });

        Ok(Self::new(
            region,
            competitors,
            support,
            reviews,
            SentimentIssueMiner::embedded()?,
            SupportKeywordFilter::embedded()?,
        ))
    }
}

impl<S: SentimentScorer> Datasets<S> {
    /// Bundles already-loaded datasets and precomputes the region-wide
    /// sentiment baseline.
    #[must_use]
    pub fn new(
        region: Option<RegionStatsStore>,
        competitors: Option<Vec<Facility>>,
        support: Option<Vec<Facility>>,
        reviews: Option<ReviewDataset>,
        miner: SentimentIssueMiner<S>,
        support_filter: SupportKeywordFilter,
    ) -> Self {
        let sentiment_baseline = reviews
            .as_ref()
            .map(|dataset| miner.baseline(dataset))
            .unwrap_or_default();

        Self {
            region,
            competitors,
            support,
            reviews,
            miner,
            sentiment_baseline,
            support_filter,
        }
    }

    /// The region dataset, if loaded.
    #[must_use]
    pub const fn region(&self) -> Option<&RegionStatsStore> {
        self.region.as_ref()
    }

    /// The region-wide sentiment baseline.
    #[must_use]
    pub const fn sentiment_baseline(&self) -> &ShareBaseline {
        &self.sentiment_baseline
    }
}

/// Checks that a request can be answered. Radii outside the recommended
/// range are accepted with a warning.
///
/// # Errors
///
/// Returns [`RequestError`] for a non-positive or non-finite radius or an
/// out-of-range coordinate.
pub fn validate(request: &AnalysisRequest) -> Result<(), RequestError> {
    let radius_km = request.radius_km;
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(RequestError::InvalidRadius { radius_km });
    }
    if !(-90.0..=90.0).contains(&request.latitude) || !(-180.0..=180.0).contains(&request.longitude)
    {
        return Err(RequestError::InvalidCoordinate {
            latitude: request.latitude,
            longitude: request.longitude,
        });
    }

    let (min, max) = RECOMMENDED_RADIUS_KM;
    if !(min..=max).contains(&radius_km) {
        log::warn!("Radius {radius_km} km is outside the recommended {min}-{max} km range");
    }
    Ok(())
}

/// Analyzes the market around one coordinate.
///
/// Returns `Ok(None)` when the coordinate falls outside every region unit,
/// or when no region dataset is loaded to resolve it against.
///
/// # Errors
///
/// Returns [`RequestError`] if the request fails [`validate`].
pub fn analyze<S: SentimentScorer>(
    datasets: &Datasets<S>,
    request: &AnalysisRequest,
) -> Result<Option<MarketReport>, RequestError> {
    validate(request)?;

    let Some(store) = datasets.region.as_ref() else {
        log::error!("Cannot resolve a location without region data");
        return Ok(None);
    };
    let Some(unit_id) = store.resolve(request.latitude, request.longitude) else {
        log::info!(
            "({}, {}) is not inside any region unit",
            request.latitude,
            request.longitude
        );
        return Ok(None);
    };
    log::debug!("Resolved ({}, {}) to {unit_id}", request.latitude, request.longitude);

    let selected_unit = store.get_unit_row(unit_id).map_or_else(
        |e| {
            log::warn!("{e}");
            BTreeMap::new()
        },
        |unit| unit.attributes.clone(),
    );

    let competitors = datasets
        .competitors
        .as_deref()
        .map(|competitors| competitor_metrics(store, competitors, request));

    let support = datasets.support.as_deref().map(|support| {
        support_metrics(
            support,
            datasets.competitors.as_deref().unwrap_or_default(),
            request,
            &datasets.support_filter,
        )
    });

    let sentiment = datasets.reviews.as_ref().map(|reviews| {
        datasets
            .miner
            .report(reviews, unit_id, &datasets.sentiment_baseline)
    });

    Ok(Some(MarketReport {
        unit_id: unit_id.to_string(),
        selected_unit,
        request: request.clone(),
        demographics: Some(demographics(store, request)),
        competitors,
        support,
        sentiment,
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use geo::{MultiPolygon, polygon};
    use site_insight_geography_models::{Facility, Field, GeoUnit, Review, ReviewColumns};

    use super::*;

    pub fn unit(id: &str, lon0: f64, lon1: f64, population: f64) -> GeoUnit {
        GeoUnit {
            id: id.to_string(),
            boundary: MultiPolygon(vec![polygon![
                (x: lon0, y: 0.0),
                (x: lon1, y: 0.0),
                (x: lon1, y: 1.0),
                (x: lon0, y: 1.0),
                (x: lon0, y: 0.0),
            ]]),
            attributes: BTreeMap::from([
                (Field::Population2021, Some(population)),
                (Field::MedianIncome2020, Some(population * 10.0)),
            ]),
        }
    }

    pub fn facility(name: &str, lon: f64, unit_id: &str, rating: f64) -> Facility {
        Facility {
            id: None,
            name: name.to_string(),
            address: format!("{name} street"),
            latitude: 0.5,
            longitude: lon,
            rating: Some(rating),
            review_count: Some(10.0),
            tags: vec!["hospital".to_string()],
            unit_id: Some(unit_id.to_string()),
        }
    }

    pub fn review(unit_id: &str, text: &str) -> Review {
        Review {
            unit_id: unit_id.to_string(),
            text: text.to_string(),
            timestamp: None,
            facility_id: None,
            facility_name: None,
            rating: None,
        }
    }

    pub fn datasets() -> Datasets {
        let region = RegionStatsStore::from_units(vec![
            unit("A", 0.0, 1.0, 1000.0),
            unit("B", 1.0, 2.0, 2000.0),
            unit("C", 2.0, 3.0, 3000.0),
        ]);
        let competitors = vec![
            facility("North Clinic", 0.5, "A", 4.0),
            facility("East Clinic", 1.5, "B", 3.0),
        ];
        let support = vec![facility("General Hospital", 0.505, "A", 4.5)];
        let reviews = ReviewDataset {
            reviews: vec![
                review("A", "Great doctors, very helpful and friendly."),
                review("A", "Terrible wait, rude staff."),
                review("B", "Excellent care."),
            ],
            columns: ReviewColumns::default(),
        };

        Datasets::new(
            Some(region),
            Some(competitors),
            Some(support),
            Some(reviews),
            SentimentIssueMiner::embedded().unwrap(),
            SupportKeywordFilter::embedded().unwrap(),
        )
    }
}
