use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::LonLat;

/// Finds the nearest of a fixed set of points to a query, by euclidean distance in lon/lat
/// degree space. Points are identified by their insertion index. When several points are equally
/// close, the lowest index wins, so answers match a first-wins linear scan.
pub struct FindClosest {
    tree: RTree<IndexedPt>,
    len: usize,
}

#[derive(Clone, Debug)]
struct IndexedPt {
    pt: [f64; 2],
    idx: usize,
}

impl RTreeObject for IndexedPt {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pt)
    }
}

impl PointDistance for IndexedPt {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        dist_squared(self.pt, *point)
    }
}

fn dist_squared(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

impl FindClosest {
    /// Non-finite points are skipped, but still consume their index.
    pub fn new(pts: &[LonLat]) -> FindClosest {
        let entries: Vec<IndexedPt> = pts
            .iter()
            .enumerate()
            .filter(|(_, pt)| pt.longitude.is_finite() && pt.latitude.is_finite())
            .map(|(idx, pt)| IndexedPt {
                pt: [pt.longitude, pt.latitude],
                idx,
            })
            .collect();
        let len = entries.len();
        FindClosest {
            tree: RTree::bulk_load(entries),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the index of the closest point, or None if there are no points or the query is
    /// non-finite.
    pub fn closest_idx(&self, query: LonLat) -> Option<usize> {
        if !query.longitude.is_finite() || !query.latitude.is_finite() {
            return None;
        }
        let query = [query.longitude, query.latitude];
        let mut best: Option<(f64, usize)> = None;
        for entry in self.tree.nearest_neighbor_iter(&query) {
            let dist = dist_squared(entry.pt, query);
            match best {
                None => {
                    best = Some((dist, entry.idx));
                }
                Some((best_dist, best_idx)) => {
                    // The iterator yields in order of increasing distance, so once it moves
                    // past the tie, nothing else can win.
                    if dist > best_dist {
                        break;
                    }
                    if entry.idx < best_idx {
                        best = Some((best_dist, entry.idx));
                    }
                }
            }
        }
        best.map(|(_, idx)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn linear_scan(pts: &[LonLat], query: LonLat) -> Option<usize> {
        let mut best = None;
        let mut min_dist = f64::INFINITY;
        for (idx, pt) in pts.iter().enumerate() {
            let d = pt.dist_squared_degrees(query);
            if d < min_dist {
                min_dist = d;
                best = Some(idx);
            }
        }
        best
    }

    #[test]
    fn empty() {
        let finder = FindClosest::new(&[]);
        assert!(finder.is_empty());
        assert_eq!(finder.closest_idx(LonLat::new(0.0, 0.0)), None);
    }

    #[test]
    fn ties_go_to_the_first() {
        let pts = vec![
            LonLat::new(1.0, 0.0),
            LonLat::new(-1.0, 0.0),
            LonLat::new(0.0, 1.0),
        ];
        let finder = FindClosest::new(&pts);
        assert_eq!(finder.closest_idx(LonLat::new(0.0, 0.0)), Some(0));
        assert_eq!(finder.closest_idx(LonLat::new(-0.9, 0.0)), Some(1));
    }

    #[test]
    fn matches_linear_scan() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        // A regular grid, like the force field, so ties actually happen
        let mut pts = Vec::new();
        for y in 0..20 {
            for x in 0..20 {
                pts.push(LonLat::new(x as f64 * 0.5, y as f64 * 0.5));
            }
        }
        let finder = FindClosest::new(&pts);
        for _ in 0..500 {
            let query = LonLat::new(rng.gen_range(-1.0..11.0), rng.gen_range(-1.0..11.0));
            assert_eq!(finder.closest_idx(query), linear_scan(&pts, query));
        }
        // Exactly between grid points
        for (x, y) in [(0.25, 0.25), (1.75, 3.0), (4.5, 4.25)] {
            let query = LonLat::new(x, y);
            assert_eq!(finder.closest_idx(query), linear_scan(&pts, query));
        }
    }
}
