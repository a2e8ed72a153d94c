use serde::{Deserialize, Serialize};

use geom::{meters_to_lat_degrees, meters_to_lon_degrees, FindClosest, GPSBounds, LonLat};

use crate::records::AreaIndex;
use crate::{Area, Attractor, CancelFlag, Config, HourOfWeek};

/// One grid point of the force field. The vector is in degrees, already scaled by the grid step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForceCell {
    pub pt: LonLat,
    pub fx: f64,
    pub fy: f64,
}

/// A regular grid of attraction vectors over the study area.
pub struct ForceField {
    cells: Vec<ForceCell>,
    closest: FindClosest,
}

impl ForceField {
    pub fn empty() -> ForceField {
        ForceField::new(Vec::new())
    }

    fn new(cells: Vec<ForceCell>) -> ForceField {
        let pts: Vec<LonLat> = cells.iter().map(|c| c.pt).collect();
        ForceField {
            closest: FindClosest::new(&pts),
            cells,
        }
    }

    pub fn cells(&self) -> &[ForceCell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The vector of the grid point nearest to `pt`, measured in lon/lat degrees. Equidistant
    /// grid points resolve to the one generated first. Zero if the field is empty.
    pub fn force_at(&self, pt: LonLat) -> (f64, f64) {
        match self.closest.closest_idx(pt) {
            Some(idx) => (self.cells[idx].fx, self.cells[idx].fy),
            None => (0.0, 0.0),
        }
    }
}

/// The bounding box of every well-formed area polygon.
pub fn study_area_bounds(areas: &[Area]) -> GPSBounds {
    AreaIndex::new(areas).bounds()
}

/// Grid points go from the minimum to the maximum corner inclusive, stepping by
/// `resolution_meters` converted to degrees at the center latitude. Every active attractor
/// within the attraction radius pulls each grid point towards it with
/// `multiplier * strength / km^decay`; the pulls are summed without normalization.
pub fn build_field(
    attractors: &[Attractor],
    bounds: &GPSBounds,
    resolution_meters: f64,
    config: &Config,
) -> ForceField {
    build_field_cancellable(
        attractors,
        bounds,
        resolution_meters,
        config,
        &CancelFlag::new(),
    )
    .unwrap_or_else(ForceField::empty)
}

/// Like `build_field`, but checks for cancellation before every row of the grid.
pub fn build_field_cancellable(
    attractors: &[Attractor],
    bounds: &GPSBounds,
    resolution_meters: f64,
    config: &Config,
    cancel: &CancelFlag,
) -> Option<ForceField> {
    if bounds.is_empty() || !(resolution_meters.is_finite() && resolution_meters > 0.0) {
        return Some(ForceField::empty());
    }
    let lat_step = meters_to_lat_degrees(resolution_meters);
    let lon_step = meters_to_lon_degrees(resolution_meters, bounds.center().latitude);
    if !(lon_step.is_finite() && lon_step > 0.0) {
        warn!("Can't build a force field around {:?}", bounds);
        return Some(ForceField::empty());
    }

    let active: Vec<&Attractor> = attractors.iter().filter(|a| a.is_active()).collect();
    let (num_rows, num_cols) = grid_size(bounds, lon_step, lat_step);
    if num_rows.saturating_mul(num_cols) > LARGE_GRID_CELLS {
        warn!(
            "The force field around {:?} at {}m has {} cells and may be slow to build. Raise \
             the resolution or shrink the study area.",
            bounds,
            resolution_meters,
            abstutil::prettyprint_usize(num_rows.saturating_mul(num_cols))
        );
    }
    debug!(
        "Building a {}x{} force field from {} attractors",
        num_cols,
        num_rows,
        active.len()
    );

    let mut cells = Vec::with_capacity(num_rows * num_cols);
    for row in 0..num_rows {
        if cancel.is_cancelled() {
            return None;
        }
        let lat = bounds.min_lat + (row as f64) * lat_step;
        for col in 0..num_cols {
            let lon = bounds.min_lon + (col as f64) * lon_step;
            let pt = LonLat::new(lon, lat);
            let (fx, fy) = pull_at(pt, &active, lon_step, lat_step, config);
            cells.push(ForceCell { pt, fx, fy });
        }
    }
    Some(ForceField::new(cells))
}

/// Above this many grid points, building a field is slow enough to be worth a warning.
pub const LARGE_GRID_CELLS: usize = 1_000_000;

/// Rows and columns of the grid, counting both ends.
fn grid_size(bounds: &GPSBounds, lon_step: f64, lat_step: f64) -> (usize, usize) {
    let num_rows = (bounds.height() / lat_step).floor() as usize + 1;
    let num_cols = (bounds.width() / lon_step).floor() as usize + 1;
    (num_rows, num_cols)
}

fn pull_at(
    pt: LonLat,
    attractors: &[&Attractor],
    lon_step: f64,
    lat_step: f64,
    config: &Config,
) -> (f64, f64) {
    let mut fx = 0.0;
    let mut fy = 0.0;
    for attractor in attractors {
        let dist_km = pt.gps_dist(attractor.pt).to_kilometers();
        if dist_km >= config.attraction_radius_km || dist_km <= config.min_attraction_distance_km
        {
            continue;
        }
        let force = config.strength_multiplier * attractor.strength / dist_km.powf(config.decay);
        let dx = attractor.pt.longitude - pt.longitude;
        let dy = attractor.pt.latitude - pt.latitude;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude > 0.0 {
            fx += (dx / magnitude) * force * lon_step;
            fy += (dy / magnitude) * force * lat_step;
        }
    }
    (fx, fy)
}

/// What a force field was built for. Attractors are a function of the hour, so the hour stands
/// in for them.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldKey {
    pub bounds: GPSBounds,
    pub hour: HourOfWeek,
    pub resolution_meters: f64,
}

/// Holds the most recently built force field and what it was built for.
pub struct FieldCache {
    key: Option<FieldKey>,
    field: ForceField,
}

impl FieldCache {
    pub fn new() -> FieldCache {
        FieldCache {
            key: None,
            field: ForceField::empty(),
        }
    }

    pub fn is_stale(&self, key: &FieldKey) -> bool {
        self.key.as_ref() != Some(key)
    }

    /// Only calls `build` if the cached field was built for something else.
    pub fn rebuild_if_stale<F: FnOnce() -> ForceField>(
        &mut self,
        key: FieldKey,
        build: F,
    ) -> &ForceField {
        if self.is_stale(&key) {
            self.install(key, build());
        }
        &self.field
    }

    pub fn install(&mut self, key: FieldKey, field: ForceField) {
        self.key = Some(key);
        self.field = field;
    }

    /// Forces the next `rebuild_if_stale` to rebuild, like when the attractors change for
    /// reasons the key doesn't capture.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    pub fn field(&self) -> &ForceField {
        &self.field
    }
}

impl Default for FieldCache {
    fn default() -> FieldCache {
        FieldCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttractorSource, TagSet};

    fn attractor(lon: f64, lat: f64, strength: f64) -> Attractor {
        Attractor {
            id: format!("{},{}", lon, lat),
            pt: LonLat::new(lon, lat),
            tags: TagSet::parse("food"),
            strength,
            source: AttractorSource::Inferred,
        }
    }

    fn bounds(half: f64) -> GPSBounds {
        GPSBounds::from(&[LonLat::new(-half, -half), LonLat::new(half, half)])
    }

    #[test]
    fn grid_covers_bounds_inclusive() {
        let config = Config::default();
        let b = bounds(0.001);
        let field = build_field(&[], &b, 100.0, &config);
        let step = meters_to_lat_degrees(100.0);
        let expected_rows = (0.002 / step).floor() as usize + 1;
        assert_eq!(field.cells().len() % expected_rows, 0);
        assert_eq!(field.cells()[0].pt, LonLat::new(-0.001, -0.001));
        for cell in field.cells() {
            assert!(b.contains(cell.pt));
            assert_eq!((cell.fx, cell.fy), (0.0, 0.0));
        }
    }

    #[test]
    fn zero_outside_radius() {
        let config = Config::default();
        let field = build_field(&[attractor(0.0, 0.0, 50.0)], &bounds(0.05), 500.0, &config);
        let mut num_pulled = 0;
        for cell in field.cells() {
            let dist_km = cell.pt.gps_dist(LonLat::new(0.0, 0.0)).to_kilometers();
            if dist_km >= 2.0 {
                assert_eq!((cell.fx, cell.fy), (0.0, 0.0), "{:?} is {}km away", cell, dist_km);
            } else if dist_km > 0.0001 {
                num_pulled += 1;
            }
        }
        assert!(num_pulled > 0);
    }

    #[test]
    fn pulls_towards_attractor() {
        let config = Config::default();
        let field = build_field(&[attractor(0.0, 0.0, 50.0)], &bounds(0.005), 100.0, &config);
        for cell in field.cells() {
            if cell.pt.longitude < -1e-9 {
                assert!(cell.fx > 0.0);
            }
            if cell.pt.longitude > 1e-9 {
                assert!(cell.fx < 0.0);
            }
            if cell.pt.latitude < -1e-9 {
                assert!(cell.fy > 0.0);
            }
            if cell.pt.latitude > 1e-9 {
                assert!(cell.fy < 0.0);
            }
        }
    }

    #[test]
    fn closer_and_stronger_pulls_harder() {
        let config = Config::default();
        let b = GPSBounds::from(&[LonLat::new(0.0, 0.0), LonLat::new(0.01, 0.0)]);
        let weak = build_field(&[attractor(0.015, 0.0, 10.0)], &b, 100.0, &config);
        let strong = build_field(&[attractor(0.015, 0.0, 20.0)], &b, 100.0, &config);
        let (weak_far, _) = weak.force_at(LonLat::new(0.0, 0.0));
        let (weak_near, _) = weak.force_at(LonLat::new(0.01, 0.0));
        let (strong_far, _) = strong.force_at(LonLat::new(0.0, 0.0));
        assert!(weak_near > weak_far);
        assert!((strong_far - 2.0 * weak_far).abs() < 1e-12);
    }

    #[test]
    fn force_matches_formula_away_from_equator() {
        let config = Config::default();
        let pt = LonLat::new(0.0, 45.0);
        let target = LonLat::new(0.003, 45.002);
        let field = build_field(
            &[attractor(target.longitude, target.latitude, 10.0)],
            &GPSBounds::from(&[pt]),
            100.0,
            &config,
        );
        assert_eq!(field.cells().len(), 1);
        let cell = field.cells()[0];
        assert_eq!(cell.pt, pt);

        let lon_step = meters_to_lon_degrees(100.0, 45.0);
        let lat_step = meters_to_lat_degrees(100.0);
        // Longitude degrees are narrower here, so swapping the steps would show up
        assert!((lon_step - lat_step).abs() > 1e-4);

        let dist_km = pt.gps_dist(target).to_kilometers();
        let force = 20.0 * 10.0 / dist_km;
        let (dx, dy): (f64, f64) = (0.003, 45.002 - 45.0);
        let magnitude = (dx * dx + dy * dy).sqrt();
        let expected_fx = dx / magnitude * force * lon_step;
        let expected_fy = dy / magnitude * force * lat_step;
        assert!(
            ((cell.fx - expected_fx) / expected_fx).abs() < 1e-12,
            "fx {} vs {}",
            cell.fx,
            expected_fx
        );
        assert!(
            ((cell.fy - expected_fy) / expected_fy).abs() < 1e-12,
            "fy {} vs {}",
            cell.fy,
            expected_fy
        );
    }

    #[test]
    fn attractor_on_a_grid_point_adds_nothing() {
        let config = Config::default();
        let pt = LonLat::new(0.001, 0.0);
        let b = GPSBounds::from(&[pt]);
        let alone = build_field(&[attractor(0.001, 0.0, 50.0)], &b, 100.0, &config);
        assert_eq!(alone.cells()[0].fx, 0.0);
        assert_eq!(alone.cells()[0].fy, 0.0);

        let nearby = attractor(0.002, 0.001, 10.0);
        let only_nearby = build_field(&[nearby.clone()], &b, 100.0, &config);
        let both = build_field(
            &[attractor(0.001, 0.0, 50.0), nearby],
            &b,
            100.0,
            &config,
        );
        assert!(only_nearby.cells()[0].fx > 0.0);
        assert_eq!(both.cells(), only_nearby.cells());
    }

    #[test]
    fn grid_size_counts_both_ends() {
        let lat_step = meters_to_lat_degrees(100.0);
        let lon_step = meters_to_lon_degrees(100.0, 0.0);
        assert_eq!(
            grid_size(&GPSBounds::from(&[LonLat::new(0.0, 0.0)]), lon_step, lat_step),
            (1, 1)
        );
        let (rows, cols) = grid_size(&bounds(0.001), lon_step, lat_step);
        assert_eq!(rows, (0.002 / lat_step).floor() as usize + 1);
        assert_eq!(cols, (0.002 / lon_step).floor() as usize + 1);

        // A city-sized area at a fine resolution is over the warning threshold
        let lat_step = meters_to_lat_degrees(10.0);
        let lon_step = meters_to_lon_degrees(10.0, 0.0);
        let (rows, cols) = grid_size(&bounds(0.1), lon_step, lat_step);
        assert!(rows * cols > LARGE_GRID_CELLS);
    }

    #[test]
    fn inactive_attractors_ignored() {
        let config = Config::default();
        let field = build_field(
            &[
                attractor(0.0, 0.0, 0.0),
                attractor(f64::NAN, 0.0, 10.0),
            ],
            &bounds(0.005),
            100.0,
            &config,
        );
        assert!(!field.is_empty());
        assert!(field.cells().iter().all(|c| c.fx == 0.0 && c.fy == 0.0));
    }

    #[test]
    fn degenerate_inputs() {
        let config = Config::default();
        let a = [attractor(0.0, 0.0, 10.0)];
        assert!(build_field(&a, &GPSBounds::new(), 100.0, &config).is_empty());
        assert!(build_field(&a, &bounds(0.01), 0.0, &config).is_empty());
        assert!(build_field(&a, &bounds(0.01), f64::NAN, &config).is_empty());

        // A single point still gets one cell
        let pt = GPSBounds::from(&[LonLat::new(0.001, 0.0)]);
        assert_eq!(build_field(&a, &pt, 100.0, &config).cells().len(), 1);

        assert_eq!(ForceField::empty().force_at(LonLat::new(0.0, 0.0)), (0.0, 0.0));
    }

    #[test]
    fn nearest_cell_lookup() {
        let config = Config::default();
        let field = build_field(&[attractor(0.0, 0.0, 50.0)], &bounds(0.005), 100.0, &config);
        for query in [
            LonLat::new(0.0012, -0.0031),
            LonLat::new(-0.004, 0.002),
            LonLat::new(1.0, 1.0),
        ] {
            let mut best = field.cells()[0];
            for cell in field.cells() {
                if cell.pt.dist_squared_degrees(query) < best.pt.dist_squared_degrees(query) {
                    best = *cell;
                }
            }
            assert_eq!(field.force_at(query), (best.fx, best.fy));
        }
    }

    #[test]
    fn cache() {
        let config = Config::default();
        let attractors = vec![attractor(0.0, 0.0, 50.0)];
        let key = FieldKey {
            bounds: bounds(0.005),
            hour: HourOfWeek::new(10).unwrap(),
            resolution_meters: 100.0,
        };

        let mut cache = FieldCache::new();
        assert!(cache.is_stale(&key));
        let mut builds = 0;
        let num_cells = cache
            .rebuild_if_stale(key.clone(), || {
                builds += 1;
                build_field(&attractors, &key.bounds, key.resolution_meters, &config)
            })
            .cells()
            .len();
        assert!(num_cells > 0);
        cache.rebuild_if_stale(key.clone(), || {
            builds += 1;
            ForceField::empty()
        });
        assert_eq!(builds, 1);
        assert_eq!(cache.field().cells().len(), num_cells);

        // A different hour is stale
        let mut other_hour = key.clone();
        other_hour.hour = HourOfWeek::new(11).unwrap();
        assert!(cache.is_stale(&other_hour));

        cache.invalidate();
        assert!(cache.is_stale(&key));
        cache.rebuild_if_stale(key.clone(), || {
            builds += 1;
            ForceField::empty()
        });
        assert_eq!(builds, 2);
        assert!(cache.field().is_empty());
    }
}
