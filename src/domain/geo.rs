//! Great-circle distance between coordinates.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A `(latitude, longitude)` pair in signed degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns an origin only when both coordinates are non-zero.
    ///
    /// A zero latitude or longitude is how clients say "no location", so it never
    /// switches a query into geo-mode.
    pub fn origin(lat: f64, lng: f64) -> Option<Self> {
        if lat != 0.0 && lng != 0.0 {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance in kilometers between two points given in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_apart() {
        for (lat, lng) in [(0.0, 0.0), (10.762622, 106.660172), (-33.86, 151.2), (89.9, -179.9)] {
            assert_eq!(haversine_km(lat, lng, lat, lng), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(21.028511, 105.804817);
        let b = GeoPoint::new(10.762622, 106.660172);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_on_the_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn origin_requires_both_coordinates() {
        assert!(GeoPoint::origin(0.0, 0.0).is_none());
        assert!(GeoPoint::origin(10.0, 0.0).is_none());
        assert!(GeoPoint::origin(0.0, 106.0).is_none());
        assert_eq!(GeoPoint::origin(10.0, 106.0), Some(GeoPoint::new(10.0, 106.0)));
    }
}
