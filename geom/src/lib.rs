//! Geometry utilities over WGS84 coordinates: great-circle distances, conversions between meters
//! and degrees, bounding boxes, single-ring polygons, and nearest-point lookups.

#[macro_use]
extern crate anyhow;

pub use crate::bounds::GPSBounds;
pub use crate::distance::Distance;
pub use crate::find_closest::FindClosest;
pub use crate::gps::{meters_to_lat_degrees, meters_to_lon_degrees, LonLat, METERS_PER_DEGREE};
pub use crate::ring::Ring;

mod bounds;
mod distance;
mod find_closest;
mod gps;
mod ring;
