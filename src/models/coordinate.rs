use geo::{GeodesicDistance, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Surface distance in meters on the WGS84 ellipsoid.
    pub fn geodesic_distance_to(&self, other: &Coordinate) -> f64 {
        let from = Point::new(self.lng, self.lat);
        let to = Point::new(other.lng, other.lat);
        from.geodesic_distance(&to)
    }
}
