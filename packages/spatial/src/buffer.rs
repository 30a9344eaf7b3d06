//! Metric buffers around a geographic point.
//!
//! Buffering directly in degrees gives circles whose real-world radius
//! varies with latitude and bearing, so the point is projected to Web
//! Mercator (EPSG:3857), buffered in metres, and projected back.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use geo::{Coord, LineString, Polygon};

/// Sphere radius used by EPSG:3857, in metres.
const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Vertices per circle (16 per quarter).
const CIRCLE_SEGMENTS: usize = 64;

/// Projects a WGS84 coordinate to Web Mercator metres.
#[must_use]
pub fn to_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = WEB_MERCATOR_RADIUS_M * lon.to_radians();
    let y = WEB_MERCATOR_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Inverse of [`to_web_mercator`].
#[must_use]
pub fn from_web_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WEB_MERCATOR_RADIUS_M).to_degrees();
    let lat = 2.0f64
        .mul_add((y / WEB_MERCATOR_RADIUS_M).exp().atan(), -FRAC_PI_2)
        .to_degrees();
    (lon, lat)
}

/// Builds a circular buffer of `radius_km` around `(lat, lon)`.
///
/// The circle is constructed in projected metres and returned in
/// geographic coordinates (x = longitude, y = latitude).
#[must_use]
pub fn buffer_km(lat: f64, lon: f64, radius_km: f64) -> Polygon<f64> {
    let (cx, cy) = to_web_mercator(lon, lat);
    let radius_m = radius_km * 1000.0;

    #[allow(clippy::cast_precision_loss)]
    let ring: Vec<Coord<f64>> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            let (x, y) = from_web_mercator(
                radius_m.mul_add(angle.cos(), cx),
                radius_m.mul_add(angle.sin(), cy),
            );
            Coord { x, y }
        })
        .collect();

    Polygon::new(LineString::from(ring), vec![])
}
