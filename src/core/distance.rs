use crate::core::MatchError;
use crate::models::GeoPoint;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
///
/// The function does not range-check its inputs; callers validate
/// coordinates with [`validate_coordinates`] before they are stored.
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two [`GeoPoint`]s
#[inline]
pub fn distance_between(from: GeoPoint, to: GeoPoint) -> f64 {
    haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}

/// Reject coordinates outside latitude [-90, 90] / longitude [-180, 180]
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), MatchError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(MatchError::InvalidInput(format!(
            "latitude {} outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(MatchError::InvalidInput(format!(
            "longitude {} outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

/// Round a distance to one decimal place for display
#[inline]
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 10.0).round() / 10.0
}
