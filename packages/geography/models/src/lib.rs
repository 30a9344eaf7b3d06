#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic unit, facility, and review types.
//!
//! These types represent the immutable datasets a site analysis runs
//! against: census-tract-like polygons with demographic attributes,
//! point facilities (competitors and support facilities), and customer
//! reviews attributed to a geographic unit.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Canonical numeric attribute of a geographic unit.
///
/// Source column names vary between census releases; every variant is
/// resolved from one of several aliases at load time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    /// Total population, 2021 census.
    #[strum(to_string = "POP2021")]
    #[serde(rename = "POP2021")]
    Population2021,
    /// Population density per square kilometre.
    #[strum(to_string = "DENS")]
    #[serde(rename = "DENS")]
    Density,
    /// Population percentage change, 2016 to 2021.
    Growth,
    /// Median total income in 2020 among recipients.
    #[strum(to_string = "MED_INC_2020")]
    #[serde(rename = "MED_INC_2020")]
    MedianIncome2020,
    /// Average total income in 2020 among recipients.
    #[strum(to_string = "AVG_INC_2020")]
    #[serde(rename = "AVG_INC_2020")]
    AverageIncome2020,
    /// Total of all age groups.
    AgeTotal,
    /// Residents aged 0 to 14.
    #[strum(to_string = "AGE_0_14")]
    #[serde(rename = "AGE_0_14")]
    Age0To14,
    /// Residents aged 15 to 64.
    #[strum(to_string = "AGE_15_64")]
    #[serde(rename = "AGE_15_64")]
    Age15To64,
    /// Residents aged 65 and over.
    #[strum(to_string = "AGE_65_PLUS")]
    #[serde(rename = "AGE_65_PLUS")]
    Age65Plus,
    /// Residents aged 85 and over.
    #[strum(to_string = "AGE_85_PLUS")]
    #[serde(rename = "AGE_85_PLUS")]
    Age85Plus,
}

/// A polygonal geographic unit (census tract or equivalent).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoUnit {
    /// Unique unit identifier (DGUID or equivalent).
    pub id: String,
    /// Boundary in geographic coordinates (x = longitude, y = latitude).
    pub boundary: MultiPolygon<f64>,
    /// Numeric attributes. `None` marks a missing or unparsable value.
    pub attributes: BTreeMap<Field, Option<f64>>,
}

impl GeoUnit {
    /// Returns the value of `field`, or `None` if it is missing.
    #[must_use]
    pub fn attribute(&self, field: Field) -> Option<f64> {
        self.attributes.get(&field).copied().flatten()
    }
}

/// A point facility: a competing clinic or a complementary support site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Source identifier (e.g. a place ID), if the dataset carries one.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Average rating, 1.0 to 5.0.
    pub rating: Option<f64>,
    /// Number of user ratings behind `rating`.
    pub review_count: Option<f64>,
    /// Free-text category tags.
    pub tags: Vec<String>,
    /// Identifier of the unit containing this facility.
    pub unit_id: Option<String>,
}

impl Facility {
    /// Returns the facility location as a `geo` point (x = longitude).
    #[must_use]
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }

    /// Identity used when deduplicating by name and address.
    #[must_use]
    pub fn name_address_key(&self) -> (&str, &str) {
        (self.name.as_str(), self.address.as_str())
    }
}

/// A facility retained by a radius query, annotated with its distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyFacility {
    /// The retained facility.
    #[serde(flatten)]
    pub facility: Facility,
    /// Geodesic distance from the query point in kilometres.
    pub distance_km: f64,
}

/// A customer review attributed to a geographic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Identifier of the unit the reviewed facility sits in.
    pub unit_id: String,
    /// Review body as written.
    pub text: String,
    /// Unix timestamp in seconds.
    pub timestamp: Option<i64>,
    /// Identifier of the reviewed facility.
    pub facility_id: Option<String>,
    /// Name of the reviewed facility.
    pub facility_name: Option<String>,
    /// Star rating attached to the review.
    pub rating: Option<f64>,
}

/// Optional review columns present in the source dataset.
///
/// Deduplication keys depend on which columns exist, not on whether a
/// particular row happens to have a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewColumns {
    /// A facility identifier column is present.
    pub facility_id: bool,
    /// A facility name column is present.
    pub facility_name: bool,
    /// A timestamp column is present.
    pub timestamp: bool,
}

/// All reviews of one dataset together with its column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDataset {
    /// Reviews in source order.
    pub reviews: Vec<Review>,
    /// Which optional columns the source carried.
    pub columns: ReviewColumns,
}

/// Compound score at or above which a review is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Compound score at or below which a review is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Three-way sentiment label derived from a compound score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum SentimentLabel {
    /// Compound score `>= 0.05`.
    Positive,
    /// Compound score strictly between the thresholds.
    Neutral,
    /// Compound score `<= -0.05`.
    Negative,
}

impl SentimentLabel {
    /// Labels a compound score using the fixed thresholds.
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}
