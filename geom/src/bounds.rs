use serde::{Deserialize, Serialize};

use crate::LonLat;

/// An axis-aligned bounding box in WGS84 degrees. Exact equality makes it usable as part of a
/// cache key.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GPSBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GPSBounds {
    /// An empty box; `update` grows it.
    pub fn new() -> GPSBounds {
        GPSBounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    pub fn from(pts: &[LonLat]) -> GPSBounds {
        let mut b = GPSBounds::new();
        for pt in pts {
            b.update(*pt);
        }
        b
    }

    pub fn update(&mut self, pt: LonLat) {
        self.min_lon = self.min_lon.min(pt.longitude);
        self.max_lon = self.max_lon.max(pt.longitude);
        self.min_lat = self.min_lat.min(pt.latitude);
        self.max_lat = self.max_lat.max(pt.latitude);
    }

    pub fn union(&mut self, other: &GPSBounds) {
        if other.is_empty() {
            return;
        }
        self.update(LonLat::new(other.min_lon, other.min_lat));
        self.update(LonLat::new(other.max_lon, other.max_lat));
    }

    /// True if nothing has been added, or the box is otherwise inverted or non-finite.
    pub fn is_empty(&self) -> bool {
        !(self.min_lon.is_finite()
            && self.min_lat.is_finite()
            && self.max_lon.is_finite()
            && self.max_lat.is_finite())
            || self.min_lon > self.max_lon
            || self.min_lat > self.max_lat
    }

    pub fn contains(&self, pt: LonLat) -> bool {
        pt.longitude >= self.min_lon
            && pt.longitude <= self.max_lon
            && pt.latitude >= self.min_lat
            && pt.latitude <= self.max_lat
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

impl Default for GPSBounds {
    fn default() -> GPSBounds {
        GPSBounds::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_and_union() {
        let mut b = GPSBounds::new();
        assert!(b.is_empty());
        b.update(LonLat::new(1.0, 2.0));
        b.update(LonLat::new(-1.0, 3.0));
        assert!(!b.is_empty());
        assert_eq!(b.center(), LonLat::new(0.0, 2.5));

        let mut other = GPSBounds::from(&[LonLat::new(5.0, 0.0)]);
        other.union(&b);
        assert_eq!(other.min_lon, -1.0);
        assert_eq!(other.max_lon, 5.0);
        assert_eq!(other.min_lat, 0.0);
        assert_eq!(other.max_lat, 3.0);

        // Unioning with nothing doesn't change anything
        let before = other;
        other.union(&GPSBounds::new());
        assert_eq!(before, other);
    }

    #[test]
    fn contains_edges() {
        let b = GPSBounds::from(&[LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0)]);
        assert!(b.contains(LonLat::new(0.0, 0.5)));
        assert!(b.contains(LonLat::new(1.0, 1.0)));
        assert!(!b.contains(LonLat::new(1.1, 0.5)));
    }
}
