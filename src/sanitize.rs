//! Coordinate validation and correction

use crate::record::CoordSource;
use rand::Rng;

/// Approximate country centers used when a node reports unusable coordinates
const COUNTRY_CENTERS: &[(&str, f64, f64)] = &[
    ("US", 37.0902, -95.7129),
    ("DE", 51.1657, 10.4515),
    ("FR", 46.2276, 2.2137),
    ("CA", 56.1304, -106.3468),
    ("FI", 61.9241, 25.7482),
    ("NL", 52.1326, 5.2913),
    ("GB", 55.3781, -3.4360),
    ("CH", 46.8182, 8.2275),
    ("AU", -25.2744, 133.7751),
    ("KR", 35.9078, 127.7669),
];

/// Max jitter (degrees, per axis) around a country center
const CENTROID_JITTER: f64 = 1.0;

pub fn country_center(country: &str) -> Option<(f64, f64)> {
    COUNTRY_CENTERS
        .iter()
        .find(|(code, _, _)| code.eq_ignore_ascii_case(country.trim()))
        .map(|&(_, lat, lng)| (lat, lng))
}

#[inline]
pub fn valid_lat(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

#[inline]
pub fn valid_lng(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

/// Return in-range coordinates for a record.
///
/// Valid input passes through untouched. Otherwise the declared country's
/// center (plus up to ±1° jitter) is used, or a uniformly random location
/// when the country is unknown.
pub fn sanitize<R: Rng + ?Sized>(
    lat: Option<f64>,
    lng: Option<f64>,
    country: Option<&str>,
    rng: &mut R,
) -> ((f64, f64), CoordSource) {
    if let (Some(lat), Some(lng)) = (lat, lng) {
        if valid_lat(lat) && valid_lng(lng) {
            return ((lat, lng), CoordSource::Reported);
        }
    }

    if let Some((clat, clng)) = country.and_then(country_center) {
        let lat = clat + rng.gen_range(-CENTROID_JITTER..=CENTROID_JITTER);
        let lng = clng + rng.gen_range(-CENTROID_JITTER..=CENTROID_JITTER);
        return ((lat.clamp(-90.0, 90.0), lng.clamp(-180.0, 180.0)), CoordSource::CountryCentroid);
    }

    let lat = rng.gen_range(-90.0..=90.0);
    let lng = rng.gen_range(-180.0..=180.0);
    ((lat, lng), CoordSource::Random)
}

/// Round to 4 decimal places so coordinates compare exactly later on
#[inline]
pub fn round_coord(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
