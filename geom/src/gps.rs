use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Distance;

/// Approximate length of one degree of latitude, and of longitude at the equator.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Converts a north/south distance into degrees of latitude.
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Converts an east/west distance into degrees of longitude, which shrink towards the poles.
pub fn meters_to_lon_degrees(meters: f64, lat: f64) -> f64 {
    meters / (METERS_PER_DEGREE * lat.to_radians().cos())
}

/// longitude is x, latitude is y
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    /// Both coordinates are finite and in the usual WGS84 ranges.
    pub fn is_valid(self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    pub fn x(self) -> f64 {
        self.longitude
    }

    pub fn y(self) -> f64 {
        self.latitude
    }

    /// Haversine distance. Both points must be valid.
    pub fn gps_dist(self, other: LonLat) -> Distance {
        let earth_radius_m = 6_371_000.0;
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        // Rounding can push this just past 1 for nearly antipodal points
        let a = ((delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos())
        .clamp(0.0, 1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Distance::meters(earth_radius_m * c)
    }

    /// Moves this point east by `dx` and north by `dy` meters, using the flat approximation at
    /// this point's latitude.
    pub fn offset_meters(self, dx: f64, dy: f64) -> LonLat {
        LonLat::new(
            self.longitude + meters_to_lon_degrees(dx, self.latitude),
            self.latitude + meters_to_lat_degrees(dy),
        )
    }

    /// Squared euclidean distance in degree space. Only meaningful for ranking nearby points.
    pub fn dist_squared_degrees(self, other: LonLat) -> f64 {
        (self.longitude - other.longitude).powi(2) + (self.latitude - other.latitude).powi(2)
    }

    pub fn to_geojson(self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Point(vec![self.longitude, self.latitude]))
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

impl From<LonLat> for geo::Point<f64> {
    fn from(pt: LonLat) -> Self {
        geo::Point::new(pt.longitude, pt.latitude)
    }
}

impl From<LonLat> for geo::Coordinate<f64> {
    fn from(pt: LonLat) -> Self {
        geo::Coordinate {
            x: pt.longitude,
            y: pt.latitude,
        }
    }
}
