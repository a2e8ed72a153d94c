use std::fmt;

use anyhow::Result;
use geo::Contains;

use crate::{GPSBounds, LonLat};

/// A closed, simple ring of WGS84 points. Holes aren't supported.
#[derive(Clone, Debug)]
pub struct Ring {
    // first equals last
    pts: Vec<LonLat>,
    bounds: GPSBounds,
    polygon: geo::Polygon<f64>,
}

impl Ring {
    /// Accepts an open or already-closed list of points. Fails for fewer than 3 distinct
    /// vertices, non-finite coordinates, repeated adjacent points, or self-intersections.
    pub fn new(mut pts: Vec<LonLat>) -> Result<Ring> {
        if let Some(pt) = pts.iter().find(|pt| !pt.is_valid()) {
            bail!("Ring has an invalid point {}", pt);
        }
        if pts.len() >= 2 && pts[0] == pts[pts.len() - 1] {
            pts.pop();
        }
        if pts.len() < 3 {
            bail!("Ring only has {} distinct points", pts.len());
        }
        pts.push(pts[0]);

        if pts.windows(2).any(|pair| pair[0] == pair[1]) {
            bail!("Ring has ~dupe adjacent pts");
        }
        if let Some((i, j)) = find_self_intersection(&pts) {
            bail!("Ring self-intersects between edges {} and {}", i, j);
        }

        let bounds = GPSBounds::from(&pts);
        let polygon = geo::Polygon::new(
            geo::LineString::from(
                pts.iter()
                    .map(|pt| geo::Coordinate::from(*pt))
                    .collect::<Vec<_>>(),
            ),
            Vec::new(),
        );
        Ok(Ring {
            pts,
            bounds,
            polygon,
        })
    }

    /// Like `new`, but from raw `[lon, lat]` pairs, the way GeoJSON stores them.
    pub fn from_lon_lat_pairs(raw: &[[f64; 2]]) -> Result<Ring> {
        Ring::new(raw.iter().map(|pair| LonLat::new(pair[0], pair[1])).collect())
    }

    /// The points, with the first repeated at the end.
    pub fn points(&self) -> &Vec<LonLat> {
        &self.pts
    }

    pub fn get_bounds(&self) -> &GPSBounds {
        &self.bounds
    }

    /// Strict containment; points exactly on the boundary are outside.
    pub fn contains_pt(&self, pt: LonLat) -> bool {
        if !pt.is_valid() || !self.bounds.contains(pt) {
            return false;
        }
        self.polygon.contains(&geo::Point::from(pt))
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        let ring: Vec<Vec<f64>> = self
            .pts
            .iter()
            .map(|pt| vec![pt.longitude, pt.latitude])
            .collect();
        geojson::Geometry::new(geojson::Value::Polygon(vec![ring]))
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  LonLat::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

// Returns the indices of the first two non-adjacent edges that touch. pts must be closed.
fn find_self_intersection(pts: &[LonLat]) -> Option<(usize, usize)> {
    let num_edges = pts.len() - 1;
    for i in 0..num_edges {
        for j in (i + 1)..num_edges {
            // Adjacent edges always share an endpoint, including the last and the first
            if j == i + 1 || (i == 0 && j == num_edges - 1) {
                continue;
            }
            if segments_touch(pts[i], pts[i + 1], pts[j], pts[j + 1]) {
                return Some((i, j));
            }
        }
    }
    None
}

fn orientation(a: LonLat, b: LonLat, c: LonLat) -> f64 {
    (b.x() - a.x()) * (c.y() - a.y()) - (b.y() - a.y()) * (c.x() - a.x())
}

// Assuming a, b, c are collinear, is c within the box spanned by a and b?
fn on_segment(a: LonLat, b: LonLat, c: LonLat) -> bool {
    c.x() >= a.x().min(b.x())
        && c.x() <= a.x().max(b.x())
        && c.y() >= a.y().min(b.y())
        && c.y() <= a.y().max(b.y())
}

fn segments_touch(p1: LonLat, p2: LonLat, q1: LonLat, q2: LonLat) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
